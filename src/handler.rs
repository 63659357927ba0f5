//! The handler capability and its function-shaped variant.
//!
//! # How handlers are stored
//!
//! A chain nests handlers of *different* concrete types: every middleware
//! layer wraps whatever sits beneath it. To hold them uniformly each layer is
//! type-erased behind `Arc<dyn ContextHandler<C>>`:
//!
//! ```text
//! async fn index(ctx: Ctx, req: Request) -> Response { … }  ← user writes this
//!        ↓ handler_fn(index)
//! HandlerFn(index)                                         ← function adapter
//!        ↓ chain.then_with_context(ctx, …)
//! Arc<dyn ContextHandler<Ctx>>                             ← BoxedHandler
//!        ↓ constructor(inner) for each layer, last to first
//! handler.call(ctx, req)  at request time                  ← one vtable call per layer
//! ```
//!
//! The handler's future resolves to the [`Response`]; that returned value is
//! the response sink.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Types ─────────────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` so the runtime can move it across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A type-erased handler shared by every request dispatched through it.
pub type BoxedHandler<C> = Arc<dyn ContextHandler<C>>;

// ── Capability ────────────────────────────────────────────────────────────────

/// Processes one request given a request-scoped context value.
///
/// Implement this on your own types when a middleware layer needs state;
/// for plain functions use [`handler_fn`].
///
/// ```rust
/// use strand::{BoxFuture, ContextHandler, Request, Response};
///
/// struct Greeting(&'static str);
///
/// impl ContextHandler<()> for Greeting {
///     fn call(&self, _ctx: (), _req: Request) -> BoxFuture {
///         let text = self.0;
///         Box::pin(async move { Response::text(text) })
///     }
/// }
/// ```
///
/// Handlers are invoked concurrently by in-flight requests, hence the
/// `Send + Sync` bound.
pub trait ContextHandler<C>: Send + Sync + 'static {
    fn call(&self, ctx: C, req: Request) -> BoxFuture;
}

/// A shared handler is itself a handler, so a [`BoxedHandler`] can be
/// returned from a constructor or passed as a terminal unchanged.
impl<C, H> ContextHandler<C> for Arc<H>
where
    H: ContextHandler<C> + ?Sized,
{
    fn call(&self, ctx: C, req: Request) -> BoxFuture {
        (**self).call(ctx, req)
    }
}

// ── Function-shaped variant ───────────────────────────────────────────────────

/// Adapts a function into a [`ContextHandler`].
///
/// Obtain via [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F>(F);

/// Wraps `f` so it can stand wherever a [`ContextHandler`] is expected.
///
/// `f` receives the context and the request, and returns a future whose
/// output is anything implementing [`IntoResponse`]:
///
/// ```rust
/// use strand::{handler_fn, Request};
///
/// let hello = handler_fn(|user: String, _req: Request| async move {
///     format!("hello, {user}")
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

impl<C, F, Fut, R> ContextHandler<C> for HandlerFn<F>
where
    F: Fn(C, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, ctx: C, req: Request) -> BoxFuture {
        let fut = (self.0)(ctx, req);
        Box::pin(async move { fut.await.into_response() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        Request::new(http::Request::new(bytes::Bytes::new()))
    }

    #[tokio::test]
    async fn function_variant_receives_context() {
        let h = handler_fn(|ctx: u32, _req: Request| async move { format!("ctx={ctx}") });

        let res = h.call(7, request()).await;
        assert_eq!(res.body().as_ref(), b"ctx=7");
    }

    #[tokio::test]
    async fn boxed_handler_delegates() {
        let inner: BoxedHandler<()> =
            Arc::new(handler_fn(|_: (), _req: Request| async { http::StatusCode::ACCEPTED }));
        let outer = Arc::new(inner);

        let res = outer.call((), request()).await;
        assert_eq!(res.status_code(), http::StatusCode::ACCEPTED);
    }
}
