//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! A request's chain mixes handlers of *different* types: application
//! middleware, group middleware, the route endpoint, the injected 404. Rust
//! collections hold one concrete type, so every handler is hidden behind a
//! **trait object** (`dyn ErasedHandler`) and stored uniformly.
//!
//! ```text
//! fn hello(ctx: &mut Context) { … }          ← user writes this
//!        ↓ router.get("/", hello)
//! hello.into_boxed_handler()                 ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(hello))                 ← stored as BoxedHandler
//!        ↓  cloned into the request's chain during traversal
//! handler.call(&mut ctx)                     ← one virtual call from Context::next
//! ```
//!
//! Cloning a [`BoxedHandler`] into a chain is one atomic increment; the
//! handler itself is shared by every request that reaches it.

use std::sync::Arc;

use crate::context::Context;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// public [`BoxedHandler`] alias.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: &mut Context);
}

/// A type-erased handler shared by every request whose chain includes it.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid handler or middleware.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the signature:
///
/// ```text
/// fn name(ctx: &mut Context)
/// ```
///
/// Middleware and endpoints share this one shape. Middleware calls
/// [`Context::next`] to run the rest of the chain; code after that call runs
/// once everything downstream has returned.
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    /// Erases the concrete type so the handler can sit in a chain.
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F> private::Sealed for F where F: Fn(&mut Context) + Send + Sync + 'static {}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype that bridges a concrete `F` into the trait-object world.
struct FnHandler<F>(F);

impl<F> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn call(&self, ctx: &mut Context) {
        (self.0)(ctx)
    }
}

/// Builds a handler chain for [`Router::add`], the `*_with` registration
/// helpers and [`Router::group`].
///
/// Each argument may be any [`Handler`]; they run in the order given.
///
/// ```rust
/// use ruta::{Context, Router, handlers};
///
/// fn audit(ctx: &mut Context) {
///     ctx.set_header("x-audited", "yes");
///     ctx.next();
/// }
///
/// # fn main() -> Result<(), ruta::Error> {
/// let api = Router::new("/api");
/// let admin = api.group("/admin", handlers![audit])?;
/// admin.post_with("/purge", handlers![audit, |ctx: &mut Context| ctx.send("purged")])?;
/// let open = api.group("/open", handlers![])?;
/// open.get("/ping", |ctx: &mut Context| ctx.send("pong"))?;
/// # Ok(())
/// # }
/// ```
///
/// [`Router::add`]: crate::Router::add
/// [`Router::group`]: crate::Router::group
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),* $(,)?) => {{
        let chain: ::std::vec::Vec<$crate::BoxedHandler> =
            ::std::vec![$($crate::Handler::into_boxed_handler($handler)),*];
        chain
    }};
}
