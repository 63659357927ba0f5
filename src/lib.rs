//! # strand
//!
//! Immutable, reusable middleware chains for context-aware HTTP handlers.
//!
//! ## The contract
//!
//! A [`Chain`] is an ordered list of middleware [`Constructor`]s. It does not
//! route, schedule or retry anything. It remembers an order, and on demand
//! folds that order around a terminal handler:
//!
//! ```text
//! Chain::new([m1, m2, m3]).then_with_context(ctx, h)   ≡   m1(m2(m3(h)))
//! ```
//!
//! The result is a [`ContextAdapter`]: the composed handler with a
//! request-scoped context value bound to it. Anything that can call a plain
//! request handler can call the adapter, including a hyper connection, since
//! the adapter implements [`hyper::service::Service`].
//!
//! Chains never change after creation. [`Chain::append`] and
//! [`Chain::extend`] return new chains with their own storage.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use strand::{Chain, Constructor, Request, Response};
//!
//! #[derive(Clone)]
//! struct App {
//!     name: Arc<str>,
//! }
//!
//! # async fn run() {
//! let server_header = Constructor::from_fn(|ctx: App, req, next| async move {
//!     let mut res = next.call(ctx.clone(), req).await;
//!     res.headers_mut().insert("server", ctx.name.parse().unwrap());
//!     res
//! });
//!
//! let chain = Chain::new([server_header]);
//! let app = chain.then_fn_with_context(
//!     App { name: "strand".into() },
//!     |_ctx: App, req: Request| async move { Response::text(format!("hello from {}", req.path())) },
//! );
//!
//! let req = Request::new(http::Request::new(bytes::Bytes::new()));
//! let res = app.serve(req).await;
//! assert_eq!(res.headers()["server"], "strand");
//! # }
//! ```

mod adapter;
mod chain;
mod constructor;
mod error;
mod handler;
mod request;
mod response;

pub use adapter::ContextAdapter;
pub use chain::Chain;
pub use constructor::Constructor;
pub use error::Error;
pub use handler::{BoxFuture, BoxedHandler, ContextHandler, HandlerFn, handler_fn};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
