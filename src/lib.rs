//! # ruta
//!
//! A minimal HTTP routing tree with explicit-continuation middleware.
//!
//! ## The model
//!
//! Routes live in a tree keyed by path segment. Each segment of a request is
//! matched against the current node's children in a fixed order:
//!
//! 1. **exact** literal (`/customer/info`), for the request method, then for `ANY`
//! 2. **regex** (`/customer/#[a-z]+`), anchored to the whole segment
//! 3. **wildcard** (`/customer/:id`), which always matches and binds `id`
//!
//! Every node passed on the way down contributes its middleware, so a request
//! collects one flat chain: application middleware, mounted-router
//! middleware, group middleware, then the route's own handlers (or a 404).
//! The chain runs by explicit continuation: each handler calls
//! [`Context::next`] to run the rest, and code after that call runs on the
//! way back out.
//!
//! The tree is built once, frozen by [`Application::build`], and shared
//! read-only by every request after that.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ruta::{Application, Context, Router, handlers};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ruta::Error> {
//!     let app = Application::new();
//!     app.wrap(ruta::middleware::trace);
//!
//!     let api = Router::new("/api");
//!     let customers = api.group("/customer", handlers![|ctx: &mut Context| {
//!         ctx.set_header("x-group", "customer");
//!         ctx.next();
//!     }])?;
//!     customers.get("", |ctx: &mut Context| ctx.send("all customers"))?;
//!     customers.get("/info", |ctx: &mut Context| ctx.send("customer info"))?;
//!     customers.get("/:id", |ctx: &mut Context| {
//!         let reply = format!("hello {}", ctx.param("id").unwrap_or_default());
//!         ctx.send(reply);
//!     })?;
//!     app.hook(&[&api]);
//!
//!     app.listen("0.0.0.0:3000").await
//! }
//! ```
//!
//! Closures passed as handlers need the `&mut Context` annotation so the
//! compiler sees them as handlers for any borrow of the context.

mod app;
mod context;
mod error;
mod handler;
mod method;
mod response;
mod router;
mod segment;
mod server;
mod status;
mod tree;

pub mod middleware;

pub use app::{Application, Engine};
pub use context::Context;
pub use error::Error;
pub use handler::{BoxedHandler, Handler};
#[doc(hidden)]
pub use handler::ErasedHandler;
pub use method::Method;
pub use response::Response;
pub use router::Router;
pub use server::Server;
pub use status::Status;
