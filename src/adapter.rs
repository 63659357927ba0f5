//! Binding a context value to a composed handler.
//!
//! A [`ContextAdapter`] is what a chain materializes into. It owns one
//! context value and one fully composed handler, both fixed at creation,
//! and hands every request to the handler together with that context. Code
//! that knows nothing about contexts can therefore drive it: either through
//! [`ContextAdapter::serve`] or, for a hyper connection, through its
//! [`Service`] impl.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Body;
use hyper::service::Service;
use tracing::warn;

use crate::handler::{BoxFuture, BoxedHandler, ContextHandler};
use crate::request::Request;
use crate::response::Response;

/// A composed handler with its request-scoped context bound.
pub struct ContextAdapter<C> {
    ctx: C,
    handler: BoxedHandler<C>,
}

impl<C: 'static> ContextAdapter<C> {
    /// Binds `ctx` to `handler` directly, without going through a chain.
    pub fn new(ctx: C, handler: impl ContextHandler<C>) -> Self {
        Self::from_boxed(ctx, Arc::new(handler))
    }

    pub(crate) fn from_boxed(ctx: C, handler: BoxedHandler<C>) -> Self {
        Self { ctx, handler }
    }

    /// The bound context value.
    pub fn context(&self) -> &C {
        &self.ctx
    }
}

impl<C: Clone + 'static> ContextAdapter<C> {
    /// Dispatches `req` to the composed handler with the bound context.
    pub fn serve(&self, req: Request) -> BoxFuture {
        self.handler.call(self.ctx.clone(), req)
    }
}

impl<C: Clone> Clone for ContextAdapter<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), handler: Arc::clone(&self.handler) }
    }
}

impl<C: fmt::Debug> fmt::Debug for ContextAdapter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextAdapter").field("ctx", &self.ctx).finish_non_exhaustive()
    }
}

// ── hyper integration ─────────────────────────────────────────────────────────

/// Serves the adapter on a hyper connection.
///
/// The body is buffered before the chain runs. A body that fails to read is
/// answered with `400 Bad Request` without entering the chain, so the error
/// type is [`Infallible`] and hyper never sees a service error.
impl<C, B> Service<http::Request<B>> for ContextAdapter<C>
where
    C: Clone + Send + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let ctx = self.ctx.clone();
        let handler = Arc::clone(&self.handler);

        Box::pin(async move {
            let response = match Request::from_http(req).await {
                Ok(req) => handler.call(ctx, req).await,
                Err(e) => {
                    warn!(error = %e, "failed to read request body");
                    Response::status(StatusCode::BAD_REQUEST)
                }
            };
            Ok(response.into_inner())
        })
    }
}
