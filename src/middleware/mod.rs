//! Built-in middleware.
//!
//! Middleware is an ordinary handler that calls
//! [`Context::next`](crate::Context::next). Anything before that call sees
//! the request on its way in; anything after it sees the response on its
//! way out. Attach it with [`Router::wrap`](crate::Router::wrap) on the
//! application, a mounted router, or a group.
//!
//! - [`trace`] — per-request span with method, path, status, latency

mod trace;

pub use trace::trace;
