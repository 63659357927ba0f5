//! Middleware constructors.
//!
//! A constructor wraps an inner handler and returns the outer one. Chains
//! only store constructors; they are called when a chain is materialized,
//! once per layer per materialization.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxedHandler, ContextHandler, handler_fn};
use crate::request::Request;
use crate::response::IntoResponse;

type WrapFn<C> = dyn Fn(BoxedHandler<C>) -> BoxedHandler<C> + Send + Sync;

/// One middleware layer: a function from the inner handler to the outer one.
///
/// Cloning is an `Arc` bump; the wrapped function is never mutated.
pub struct Constructor<C>(Arc<WrapFn<C>>);

impl<C: 'static> Constructor<C> {
    /// Builds a constructor from any function returning a handler.
    ///
    /// ```rust
    /// use strand::{BoxedHandler, Constructor};
    ///
    /// // A layer that does nothing: hands back the inner handler.
    /// let identity = Constructor::<()>::new(|next: BoxedHandler<()>| next);
    /// # let _ = identity;
    /// ```
    pub fn new<F, H>(f: F) -> Self
    where
        F: Fn(BoxedHandler<C>) -> H + Send + Sync + 'static,
        H: ContextHandler<C>,
    {
        Self(Arc::new(move |next: BoxedHandler<C>| Arc::new(f(next)) as BoxedHandler<C>))
    }

    /// Builds a constructor from an "around" function.
    ///
    /// `f` sees the context, the request, and the next handler, and decides
    /// whether and how to call it:
    ///
    /// ```rust
    /// use strand::{Constructor, Response};
    /// use http::StatusCode;
    ///
    /// let auth = Constructor::<()>::from_fn(|ctx, req, next| async move {
    ///     if req.header("authorization").is_none() {
    ///         return Response::status(StatusCode::UNAUTHORIZED);
    ///     }
    ///     next.call(ctx, req).await
    /// });
    /// # let _ = auth;
    /// ```
    ///
    /// Every materialization gets its own wrapping handler.
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(C, Request, BoxedHandler<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |next: BoxedHandler<C>| {
            let f = Arc::clone(&f);
            handler_fn(move |ctx: C, req: Request| f(ctx, req, Arc::clone(&next)))
        })
    }

    /// Applies this layer around `inner`.
    pub(crate) fn wrap(&self, inner: BoxedHandler<C>) -> BoxedHandler<C> {
        (self.0)(inner)
    }
}

impl<C> Clone for Constructor<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C> fmt::Debug for Constructor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor").finish_non_exhaustive()
    }
}
