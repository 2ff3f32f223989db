//! The response sink.
//!
//! Handlers never build a [`Response`] directly. They call
//! [`Context::send`](crate::Context::send) or
//! [`Context::json`](crate::Context::json), which write through here. After
//! the chain has finished, the transport turns the sink into the bytes that
//! go back to the client.
//!
//! Writes are not guarded. The first write fixes the status line and
//! headers; every later write appends to the body. A later write that asks
//! for a different status is logged and the status is left alone.

use bytes::{Bytes, BytesMut};
use http_body_util::Full;
use tracing::warn;

/// Response state accumulated for one request.
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: BytesMut,
    writes: usize,
}

impl Response {
    pub(crate) fn new() -> Self {
        Self { status: 200, headers: Vec::new(), body: BytesMut::new(), writes: 0 }
    }

    /// Writes a status, headers and a body chunk.
    pub fn write_response(&mut self, status: u16, headers: &[(String, String)], body: &[u8]) {
        if self.writes == 0 {
            self.status = status;
            self.headers = headers.to_vec();
        } else if status != self.status {
            warn!(
                committed = self.status,
                ignored = status,
                "superfluous status write on an already written response"
            );
        }
        self.body.extend_from_slice(body);
        self.writes += 1;
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `true` once anything has been written.
    pub fn is_written(&self) -> bool { self.writes > 0 }

    /// How many times the sink was written to.
    pub fn writes(&self) -> usize { self.writes }

    /// Converts into the hyper response type. Headers that are not valid
    /// HTTP are dropped with a warning.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            match (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        let body = Full::new(self.body.freeze());
        match builder.body(body) {
            Ok(response) => response,
            Err(e) => {
                warn!(status = self.status, "invalid response: {e}");
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            }
        }
    }
}
