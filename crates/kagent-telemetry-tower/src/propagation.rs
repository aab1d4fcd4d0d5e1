//! Tower layer that extracts trace context at the transport edge.

use std::task::{Context, Poll};

use tower::{Layer, Service};

use crate::context::RequestContext;

/// Tower layer for `http::Request` services that extracts the incoming
/// trace context and stores a [`RequestContext`] in the request extensions.
///
/// Downstream tool services retrieve it via
/// `request.extensions().get::<RequestContext>()`.
#[derive(Clone, Debug, Default)]
pub struct PropagationLayer;

impl PropagationLayer {
    /// Creates a new propagation layer.
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for PropagationLayer {
    type Service = PropagationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PropagationService { inner }
    }
}

/// Service produced by [`PropagationLayer`].
#[derive(Clone, Debug)]
pub struct PropagationService<S> {
    inner: S,
}

impl<S, B> Service<http::Request<B>> for PropagationService<S>
where
    S: Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: http::Request<B>) -> Self::Future {
        let context = RequestContext::extract(request.headers());
        request.extensions_mut().insert(context);
        self.inner.call(request)
    }
}
