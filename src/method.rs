//! HTTP method as a typed enum.
//!
//! Covers the RFC 9110 standard methods plus [`Method::Any`], the
//! method-agnostic bucket used by groups and mounted routers. `Any` is a
//! registration-side concept: it never parses from the wire, and lookups
//! only fall back to it after the request's own method found nothing.
//!
//! Unknown method strings are rejected by the server with
//! `405 Method Not Allowed` before they ever reach the routing tree.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method, or the `Any` registration bucket.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    // RFC 9110 ─────────────────────────────────────────────────────────────────
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
    // Registration bucket ──────────────────────────────────────────────────────
    Any,
}

impl Method {
    /// Returns the uppercase representation (e.g. `"GET"`, `"ANY"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
            Self::Any     => "ANY",
        }
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
///
/// `"ANY"` is deliberately rejected: a request cannot ask for the fallback bucket.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(()),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = ();

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_methods() {
        assert_eq!("GET".parse::<Method>(), Ok(Method::Get));
        assert_eq!("DELETE".parse::<Method>(), Ok(Method::Delete));
        assert_eq!(Method::try_from(&http::Method::PATCH), Ok(Method::Patch));
    }

    #[test]
    fn rejects_any_and_lowercase() {
        assert!("ANY".parse::<Method>().is_err());
        assert!("get".parse::<Method>().is_err());
        assert!(Method::try_from(&http::Method::from_bytes(b"PURGE").unwrap()).is_err());
    }

    #[test]
    fn displays_uppercase() {
        assert_eq!(Method::Any.to_string(), "ANY");
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
