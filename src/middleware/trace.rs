use std::time::Instant;

use tracing::{info, info_span};

use crate::context::Context;

/// Logs one `info` event per request, inside a `request` span carrying the
/// method and path, once the rest of the chain has returned.
///
/// ```rust
/// use ruta::{Application, middleware};
///
/// let app = Application::new();
/// app.wrap(middleware::trace);
/// ```
pub fn trace(ctx: &mut Context) {
    let span = info_span!("request", method = %ctx.method(), path = %ctx.path());
    let _entered = span.enter();
    let started = Instant::now();

    ctx.next();

    info!(
        status = ctx.response().status(),
        written = ctx.is_sent(),
        latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "request finished"
    );
}
