//! Immutable middleware chains.
//!
//! A [`Chain`] remembers an ordered list of [`Constructor`]s and nothing
//! else. Constructors run only when the chain is materialized against a
//! terminal handler; deriving a chain with [`append`](Chain::append) or
//! [`extend`](Chain::extend) copies the list into fresh storage and leaves
//! the receiver untouched.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error};

use crate::adapter::ContextAdapter;
use crate::constructor::Constructor;
use crate::error::Error;
use crate::handler::{BoxedHandler, ContextHandler, handler_fn};
use crate::request::Request;
use crate::response::IntoResponse;

/// An ordered, immutable list of middleware constructors.
///
/// Declaration order is request order:
///
/// ```text
/// Chain::new([m1, m2, m3]).then_with_context(ctx, h)
///     ≡  m1(m2(m3(h)))
///     request flow: m1 → m2 → m3 → h
/// ```
///
/// A chain can be reused freely. Every materialization calls each
/// constructor again, so several instances of the same middleware exist
/// when a chain backs several endpoints:
///
/// ```rust
/// use strand::{Chain, Constructor, Request};
///
/// let common: Chain<()> = Chain::new([Constructor::new(|next| next)]);
///
/// let index = common.then_fn_with_context((), |_, _: Request| async { "index" });
/// let about = common.then_fn_with_context((), |_, _: Request| async { "about" });
/// # let _ = (index, about);
/// ```
pub struct Chain<C> {
    constructors: Vec<Constructor<C>>,
}

impl<C: 'static> Chain<C> {
    /// Creates a chain from constructors in request order.
    ///
    /// Nothing is invoked here. An empty chain materializes to the terminal
    /// handler alone.
    pub fn new(constructors: impl IntoIterator<Item = Constructor<C>>) -> Self {
        Self { constructors: constructors.into_iter().collect() }
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Composes the chain around `terminal` and binds `ctx` to the result.
    ///
    /// Constructors are applied from last to first so the first declared
    /// layer ends up outermost. A constructor that panics aborts the call;
    /// the panic is not caught.
    pub fn then_with_context(&self, ctx: C, terminal: impl ContextHandler<C>) -> ContextAdapter<C> {
        let mut current: BoxedHandler<C> = Arc::new(terminal);
        for constructor in self.constructors.iter().rev() {
            current = constructor.wrap(current);
        }

        debug!(layers = self.constructors.len(), "chain materialized");
        ContextAdapter::from_boxed(ctx, current)
    }

    /// Same as [`then_with_context`](Chain::then_with_context) with a plain
    /// function as the terminal.
    ///
    /// `c.then_fn_with_context(ctx, f)` is equivalent to
    /// `c.then_with_context(ctx, handler_fn(f))`.
    pub fn then_fn_with_context<F, Fut, R>(&self, ctx: C, f: F) -> ContextAdapter<C>
    where
        F: Fn(C, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.then_with_context(ctx, handler_fn(f))
    }

    /// Like [`then_with_context`](Chain::then_with_context), for a terminal
    /// that may be absent.
    ///
    /// Returns [`Error::MissingTerminal`] when `terminal` is `None`. No
    /// constructor runs in that case and no default handler is substituted.
    pub fn try_then_with_context<H>(
        &self,
        ctx: C,
        terminal: Option<H>,
    ) -> Result<ContextAdapter<C>, Error>
    where
        H: ContextHandler<C>,
    {
        match terminal {
            Some(h) => Ok(self.then_with_context(ctx, h)),
            None => {
                error!(layers = self.constructors.len(), "chain materialized without a terminal handler");
                Err(Error::MissingTerminal)
            }
        }
    }

    /// Function-terminal counterpart of
    /// [`try_then_with_context`](Chain::try_then_with_context).
    pub fn try_then_fn_with_context<F, Fut, R>(
        &self,
        ctx: C,
        f: Option<F>,
    ) -> Result<ContextAdapter<C>, Error>
    where
        F: Fn(C, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + Send + 'static,
    {
        self.try_then_with_context(ctx, f.map(handler_fn))
    }

    /// Returns a new chain running `more` after this chain's layers, i.e.
    /// nearer the terminal handler.
    ///
    /// ```text
    /// std = Chain::new([m1, m2])
    /// ext = std.append([m3, m4])
    /// // requests through std go m1 → m2
    /// // requests through ext go m1 → m2 → m3 → m4
    /// ```
    pub fn append(&self, more: impl IntoIterator<Item = Constructor<C>>) -> Self {
        let more = more.into_iter();
        let mut constructors = Vec::with_capacity(self.constructors.len() + more.size_hint().0);
        constructors.extend(self.constructors.iter().cloned());
        constructors.extend(more);
        Self { constructors }
    }

    /// Returns a new chain running `other`'s layers after this chain's.
    ///
    /// Equivalent to `self.append(other's constructors)`. Useful when an
    /// inner handler needs the tail of a chain on its own, e.g. a CSRF
    /// middleware whose failure handler must still pass through `tail`:
    ///
    /// ```text
    /// tail = Chain::new([m2])
    /// html = Chain::new([m1, csrf(fail = tail.then(csrf_fail))]).extend(&tail)
    /// // success: m1 → csrf → m2 → target
    /// // failure: m1 → csrf → m2 → csrf_fail
    /// ```
    pub fn extend(&self, other: &Chain<C>) -> Self {
        self.append(other.constructors.iter().cloned())
    }
}

impl<C> Clone for Chain<C> {
    fn clone(&self) -> Self {
        Self { constructors: self.constructors.clone() }
    }
}

impl<C> Default for Chain<C> {
    fn default() -> Self {
        Self { constructors: Vec::new() }
    }
}

impl<C> FromIterator<Constructor<C>> for Chain<C> {
    fn from_iter<I: IntoIterator<Item = Constructor<C>>>(iter: I) -> Self {
        Self { constructors: iter.into_iter().collect() }
    }
}

impl<C> fmt::Debug for Chain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain").field("layers", &self.constructors.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(calls: &Arc<AtomicUsize>) -> Constructor<()> {
        let calls = Arc::clone(calls);
        Constructor::new(move |next: BoxedHandler<()>| {
            calls.fetch_add(1, Ordering::SeqCst);
            next
        })
    }

    #[test]
    fn new_does_not_invoke_constructors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = Chain::new([counting(&calls), counting(&calls)]);

        assert_eq!(chain.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn each_materialization_invokes_every_constructor_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = Chain::new([counting(&calls), counting(&calls), counting(&calls)]);

        chain.then_fn_with_context((), |_, _: Request| async { "a" });
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        chain.then_fn_with_context((), |_, _: Request| async { "b" });
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn missing_terminal_skips_constructors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = Chain::new([counting(&calls)]);

        let res = chain.try_then_with_context((), None::<BoxedHandler<()>>);

        assert!(matches!(res, Err(Error::MissingTerminal)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn append_allocates_fresh_storage() {
        let base: Chain<()> = Chain::new([Constructor::new(|next| next)]);
        let ext = base.append([Constructor::new(|next| next)]);

        assert_eq!(base.len(), 1);
        assert_eq!(ext.len(), 2);
        assert_ne!(base.constructors.as_ptr(), ext.constructors.as_ptr());
    }

    #[test]
    fn default_and_collect() {
        let empty: Chain<()> = Chain::default();
        assert!(empty.is_empty());

        let collected: Chain<()> = (0..4).map(|_| Constructor::new(|next| next)).collect();
        assert_eq!(collected.len(), 4);
        assert_eq!(format!("{collected:?}"), "Chain { layers: 4 }");
    }
}
