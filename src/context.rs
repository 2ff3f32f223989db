//! Per-request state and the continuation mechanism.
//!
//! # How a chain runs
//!
//! Routing flattens every middleware and endpoint a request passes into one
//! ordered chain. Nothing runs during routing. Execution starts with one call
//! to [`Context::next`], and each handler decides whether the rest of the
//! chain runs by calling `next` itself:
//!
//! ```text
//! app mw ──next()──▶ group mw ──next()──▶ endpoint
//!   ◀── returns ───────  ◀── returns ─────────┘
//! ```
//!
//! Code before `next()` runs on the way in, in registration order. Code after
//! it runs on the way out, innermost first. A handler that never calls
//! `next()` ends the chain right there.
//!
//! The cursor is explicit state on the context rather than a captured
//! closure, so a stopped chain is observable: [`Context::remaining`] reports
//! what never ran.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use serde::Serialize;
use tracing::error;

use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::response::Response;
use crate::status::Status;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// One request in flight: what was asked, what matched, and what to answer.
pub struct Context {
    pub(crate) method: Method,
    pub(crate) path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) chain: Vec<BoxedHandler>,
    cursor: usize,
    status: u16,
    response_headers: Vec<(String, String)>,
    response: Response,
}

impl Context {
    /// Creates a context for `method` and a request target such as
    /// `/customer/42?verbose=1`. The query string, if any, is split off and
    /// decoded.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, Vec::new()),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            chain: Vec::new(),
            cursor: 0,
            status: 200,
            response_headers: Vec::new(),
            response: Response::new(),
        }
    }

    /// Attaches the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attaches the request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    // ── Request view ──────────────────────────────────────────────────────────

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Case-insensitive request header lookup. Values that are not visible
    /// ASCII read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/customer/:id`, `ctx.param("id")` on `/customer/42`
    /// returns `Some("42")`. Named groups of `#` regex segments land here too.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    /// First value of a query-string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All query-string pairs in request order, repeats included.
    pub fn queries(&self) -> &[(String, String)] { &self.query }

    // ── Continuation ──────────────────────────────────────────────────────────

    /// Runs the next handler in the chain, and with it whatever that handler
    /// lets run after it.
    ///
    /// Past the end of the chain this is a no-op. Calling it twice from one
    /// handler runs the remainder of the chain again from wherever the cursor
    /// stands; nothing guards against that.
    pub fn next(&mut self) {
        let Some(handler) = self.chain.get(self.cursor).cloned() else {
            self.cursor = self.chain.len();
            return;
        };
        self.cursor += 1;
        handler.call(self);
    }

    /// Number of handlers in the assembled chain.
    pub fn chain_len(&self) -> usize { self.chain.len() }

    /// Number of handlers that have not been started.
    pub fn remaining(&self) -> usize { self.chain.len() - self.cursor }

    pub(crate) fn push_handler(&mut self, handler: BoxedHandler) {
        self.chain.push(handler);
    }

    pub(crate) fn extend_chain(&mut self, handlers: &[BoxedHandler]) {
        self.chain.extend(handlers.iter().cloned());
    }

    // ── Response surface ──────────────────────────────────────────────────────

    /// The status the next [`send`](Self::send) will write. Starts at 200.
    pub fn status(&self) -> u16 { self.status }

    pub fn set_status(&mut self, status: impl Into<u16>) {
        self.status = status.into();
    }

    /// Adds a response header for the next write. Setting a name again
    /// replaces the earlier value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.response_headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value,
            None => self.response_headers.push((name.to_owned(), value)),
        }
    }

    /// Writes the current status and `body` to the response sink, as
    /// `text/plain` unless a content type was set.
    ///
    /// Every call writes again; see [`Response`] for what repeated writes do.
    pub fn send(&mut self, body: impl AsRef<[u8]>) {
        self.write(TEXT_PLAIN, body.as_ref());
    }

    /// Serialises `value` and writes it as `application/json`. A value that
    /// fails to serialise is answered with `500`.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.write(APPLICATION_JSON, &bytes),
            Err(e) => {
                error!(path = %self.path, "json serialisation failed: {e}");
                self.status = Status::InternalServerError.into();
                self.write(TEXT_PLAIN, b"Internal Server Error");
            }
        }
    }

    /// `true` once anything was written to the response.
    pub fn is_sent(&self) -> bool { self.response.is_written() }

    pub fn response(&self) -> &Response { &self.response }

    pub(crate) fn into_response(self) -> Response { self.response }

    /// Writes with the headers set so far, plus `default_type` as the
    /// content type for this write only when none was set.
    fn write(&mut self, default_type: &str, body: &[u8]) {
        if self.response_headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
            self.response.write_response(self.status, &self.response_headers, body);
            return;
        }
        let mut headers = Vec::with_capacity(self.response_headers.len() + 1);
        headers.extend(self.response_headers.iter().cloned());
        headers.push(("content-type".to_owned(), default_type.to_owned()));
        self.response.write_response(self.status, &headers, body);
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::handler::Handler;

    type Log = Arc<Mutex<Vec<String>>>;

    fn around(log: &Log, name: &'static str) -> BoxedHandler {
        let log = Arc::clone(log);
        (move |ctx: &mut Context| {
            log.lock().unwrap().push(format!("{name} in"));
            ctx.next();
            log.lock().unwrap().push(format!("{name} out"));
        })
        .into_boxed_handler()
    }

    fn stop(log: &Log, name: &'static str) -> BoxedHandler {
        let log = Arc::clone(log);
        (move |_: &mut Context| log.lock().unwrap().push(name.to_owned())).into_boxed_handler()
    }

    #[test]
    fn splits_query_from_path() {
        let ctx = Context::new(Method::Get, "/search?q=rust+web&page=2&q=again");
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query("q"), Some("rust web"));
        assert_eq!(ctx.query("page"), Some("2"));
        assert_eq!(ctx.queries().len(), 3);
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "abc".parse().unwrap());
        let ctx = Context::new(Method::Get, "/").with_headers(headers).with_body("payload");
        assert_eq!(ctx.header("X-Request-Id"), Some("abc"));
        assert_eq!(ctx.body(), b"payload");
    }

    #[test]
    fn next_runs_around_advice_in_lifo_order() {
        let log = Log::default();
        let mut ctx = Context::new(Method::Get, "/");
        ctx.push_handler(around(&log, "outer"));
        ctx.push_handler(around(&log, "inner"));
        ctx.push_handler(stop(&log, "endpoint"));
        ctx.next();
        assert_eq!(
            *log.lock().unwrap(),
            ["outer in", "inner in", "endpoint", "inner out", "outer out"]
        );
        assert_eq!(ctx.remaining(), 0);
    }

    #[test]
    fn handler_without_next_truncates_chain() {
        let log = Log::default();
        let mut ctx = Context::new(Method::Get, "/");
        ctx.push_handler(around(&log, "outer"));
        ctx.push_handler(stop(&log, "gate"));
        ctx.push_handler(stop(&log, "endpoint"));
        ctx.next();
        assert_eq!(*log.lock().unwrap(), ["outer in", "gate", "outer out"]);
        assert_eq!(ctx.remaining(), 1);
    }

    #[test]
    fn next_past_end_is_a_no_op() {
        let mut ctx = Context::new(Method::Get, "/");
        ctx.next();
        ctx.next();
        assert_eq!(ctx.remaining(), 0);
        assert!(!ctx.is_sent());
    }

    #[test]
    fn double_next_continues_from_cursor() {
        let log = Log::default();
        let twice = {
            let log = Arc::clone(&log);
            (move |ctx: &mut Context| {
                log.lock().unwrap().push("twice".to_owned());
                ctx.next();
                ctx.next();
            })
            .into_boxed_handler()
        };
        let mut ctx = Context::new(Method::Get, "/");
        ctx.push_handler(twice);
        ctx.push_handler(stop(&log, "a"));
        ctx.push_handler(stop(&log, "b"));
        ctx.next();
        assert_eq!(*log.lock().unwrap(), ["twice", "a", "b"]);
    }

    #[test]
    fn send_writes_current_status_as_text() {
        let mut ctx = Context::new(Method::Get, "/");
        ctx.set_status(Status::Created);
        ctx.set_header("location", "/customer/7");
        ctx.send("made");
        let res = ctx.into_response();
        assert_eq!(res.status(), 201);
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(res.header("location"), Some("/customer/7"));
        assert_eq!(res.text(), "made");
    }

    #[test]
    fn send_twice_writes_twice() {
        let mut ctx = Context::new(Method::Get, "/");
        ctx.send("a");
        ctx.send("b");
        assert_eq!(ctx.response().writes(), 2);
        assert_eq!(ctx.response().text(), "ab");
    }

    #[test]
    fn json_sets_content_type() {
        #[derive(Serialize)]
        struct Customer<'a> {
            id: u32,
            name: &'a str,
        }

        let mut ctx = Context::new(Method::Get, "/");
        ctx.json(&Customer { id: 42, name: "ada" });
        let res = ctx.into_response();
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.text(), r#"{"id":42,"name":"ada"}"#);
    }

    #[test]
    fn json_failure_is_a_500() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not json");
        let mut ctx = Context::new(Method::Get, "/");
        ctx.json(&map);
        assert_eq!(ctx.response().status(), 500);
    }

    #[test]
    fn default_content_type_applies_to_one_write_only() {
        let mut ctx = Context::new(Method::Get, "/");
        ctx.send("plain");
        assert!(ctx.response_headers.is_empty());
        assert_eq!(ctx.response().header("content-type"), Some("text/plain; charset=utf-8"));

        ctx.set_header("x-trace", "1");
        assert_eq!(ctx.response_headers, [("x-trace".to_owned(), "1".to_owned())]);

        let mut fresh = Context::new(Method::Get, "/");
        fresh.response_headers = ctx.response_headers.clone();
        fresh.json(&[1, 2]);
        assert_eq!(fresh.response().header("content-type"), Some("application/json"));
        assert_eq!(fresh.response().header("x-trace"), Some("1"));
    }

    #[test]
    fn explicit_content_type_wins() {
        let mut ctx = Context::new(Method::Get, "/");
        ctx.set_header("Content-Type", "text/html; charset=utf-8");
        ctx.send("<p>hi</p>");
        assert_eq!(ctx.response().header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(ctx.response().headers().len(), 1);
    }
}
