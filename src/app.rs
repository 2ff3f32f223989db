//! The application: root router, build step, and request entry point.

use std::any::Any;
use std::ops::Deref;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error};

use crate::context::Context;
use crate::error::Error;
use crate::response::Response;
use crate::router::Router;
use crate::server::Server;
use crate::status::Status;
use crate::tree::Node;

type PanicHandler = Arc<dyn Fn(&mut Context, &str) + Send + Sync + 'static>;

/// The root of the routing tree.
///
/// Dereferences to its root [`Router`], so `app.get(..)`, `app.wrap(..)` and
/// `app.hook(..)` register directly on the root. Middleware wrapped here runs
/// for every request, matched or not.
pub struct Application {
    root: Router,
    on_panic: PanicHandler,
}

impl Application {
    pub fn new() -> Self {
        Self {
            root: Router::new(""),
            on_panic: Arc::new(internal_error),
        }
    }

    /// Replaces the handler that answers when something in a chain panics.
    ///
    /// It receives the request's context, with whatever had been written so
    /// far, and the panic message. The default writes
    /// `500 Internal Server Error` unless a response was already sent.
    pub fn on_panic<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context, &str) + Send + Sync + 'static,
    {
        self.on_panic = Arc::new(handler);
        self
    }

    /// Freezes the route table into an [`Engine`] that can be shared across
    /// threads. Registration after this point does not affect the engine.
    pub fn build(&self) -> Result<Engine, Error> {
        let root = self.root.freeze(&mut Vec::new())?;
        debug!("route table frozen");
        Ok(Engine { root, on_panic: Arc::clone(&self.on_panic) })
    }

    /// Builds the engine and serves it on `addr` until a shutdown signal.
    ///
    /// The route table is checked before anything binds, so a bad table
    /// fails without touching the network.
    pub fn listen(self, addr: &str) -> impl Future<Output = Result<(), Error>> + Send + use<> {
        let ready = self.build().and_then(|engine| Ok((engine, Server::bind(addr)?)));
        async move {
            let (engine, server) = ready?;
            server.serve(engine).await
        }
    }
}

impl Default for Application {
    fn default() -> Self { Self::new() }
}

impl Deref for Application {
    type Target = Router;

    fn deref(&self) -> &Router { &self.root }
}

/// The immutable, thread-safe request entry point produced by
/// [`Application::build`].
pub struct Engine {
    root: Node,
    on_panic: PanicHandler,
}

impl Engine {
    /// Routes `ctx`, runs its chain to completion, and returns what was written.
    pub fn handle(&self, mut ctx: Context) -> Response {
        self.root.find(&mut ctx);
        debug!(method = %ctx.method(), path = %ctx.path(), chain = ctx.chain_len(), "dispatching");

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| ctx.next())) {
            let message = panic_message(&*payload);
            error!(method = %ctx.method(), path = %ctx.path(), "handler panicked: {message}");
            let on_panic = Arc::clone(&self.on_panic);
            if panic::catch_unwind(AssertUnwindSafe(|| on_panic(&mut ctx, message))).is_err() {
                error!("panic handler panicked");
            }
        }

        if !ctx.is_sent() {
            debug!(path = %ctx.path(), "chain finished without writing a response");
        }
        ctx.into_response()
    }
}

fn internal_error(ctx: &mut Context, _message: &str) {
    if ctx.is_sent() {
        return;
    }
    ctx.set_status(Status::InternalServerError);
    ctx.send("Internal Server Error");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
