//! Minimal ruta example: nested middleware, a mounted API router, and the
//! three segment kinds.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/customer           # group node → hello customers
//!   curl http://localhost:3000/api/customer/42        # wildcard   → hello 42
//!   curl http://localhost:3000/api/customer/info      # exact      → hello customer info
//!   curl http://localhost:3000/api/customer/x         # regex      → hello customer regex
//!   curl -X POST http://localhost:3000/api/customer/7 # POST       → hello post 7
//!   curl http://localhost:3000/api/data?limit=5
//!   curl http://localhost:3000/nope                   # 404 Not Found
//!
//! The server log shows the middleware wrapping each request:
//! app start → router start → group start → handler → group end → router end → app end

use ruta::{Application, Context, Router, handlers, middleware};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Data<'a> {
    items: &'a [&'a str],
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<(), ruta::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = Application::new();
    app.wrap(middleware::trace);
    app.wrap(|ctx: &mut Context| {
        info!("middleware by app start");
        ctx.next();
        info!("middleware by app end");
    });

    let router = Router::new("/api");
    let group = router.group("/customer", handlers![|ctx: &mut Context| {
        info!("middleware by group start");
        ctx.next();
        info!("middleware by group end");
    }])?;

    router.wrap(|ctx: &mut Context| {
        info!("middleware by router start");
        ctx.next();
        info!("middleware by router end");
    });

    group.get("", |ctx: &mut Context| ctx.send("hello customers"))?;
    group.get("/:id", get_customer)?;
    group.get("/#[a-z]", |ctx: &mut Context| ctx.send("hello customer regex"))?;
    group.get("/info", |ctx: &mut Context| ctx.send("hello customer info"))?;
    group.post("/:id", |ctx: &mut Context| {
        let reply = format!("hello post {}", ctx.param("id").unwrap_or_default());
        ctx.send(reply);
    })?;

    router.get("/data", get_data)?;

    app.hook(&[&router]);

    app.listen("0.0.0.0:3000").await
}

// GET /api/customer/:id
fn get_customer(ctx: &mut Context) {
    let reply = format!("hello {}", ctx.param("id").unwrap_or_default());
    ctx.send(reply);
}

// GET /api/data?limit=N
fn get_data(ctx: &mut Context) {
    let limit = ctx.query("limit").and_then(|v| v.parse().ok()).unwrap_or(10);
    ctx.json(&Data { items: &["a", "b", "c"], limit });
}
