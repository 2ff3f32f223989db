//! Path segment classification and matching.
//!
//! A route pattern is split on `/`; each piece is one [`Segment`]:
//!
//! | Written as | Kind | Matches |
//! |---|---|---|
//! | `info` | exact | only the literal `info` |
//! | `:id` | wildcard | any value, bound to `params["id"]` |
//! | `#[0-9]+` | regex | values the whole pattern matches; named groups are bound |
//!
//! Regex segments are compiled here, once, when the route is registered.

use std::collections::HashMap;

use regex::Regex;

/// One classified segment of a route pattern.
#[derive(Clone, Debug)]
pub(crate) enum Segment {
    Exact(String),
    Regex(Pattern),
    Wildcard(String),
}

impl Segment {
    /// Classifies `raw` by its leading character, compiling regex segments.
    pub(crate) fn parse(raw: &str) -> Result<Self, regex::Error> {
        if let Some(name) = raw.strip_prefix(':') {
            Ok(Self::Wildcard(name.to_owned()))
        } else if let Some(source) = raw.strip_prefix('#') {
            Pattern::compile(source).map(Self::Regex)
        } else {
            Ok(Self::Exact(raw.to_owned()))
        }
    }

    /// The text after the classifying prefix: literal, parameter name, or regex source.
    pub(crate) fn pattern(&self) -> &str {
        match self {
            Self::Exact(literal) => literal,
            Self::Regex(pattern) => pattern.source(),
            Self::Wildcard(name) => name,
        }
    }
}

/// A regex segment, anchored to the whole segment value.
#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub(crate) fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self { source: source.to_owned(), regex })
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    /// Tests `value` and, on a match, binds every named capture group into `params`.
    ///
    /// Groups that did not participate in the match are left unbound.
    pub(crate) fn capture(&self, value: &str, params: &mut HashMap<String, String>) -> bool {
        let Some(caps) = self.regex.captures(value) else {
            return false;
        };
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                params.insert(name.to_owned(), m.as_str().to_owned());
            }
        }
        true
    }
}

/// Splits a route pattern or request path into segments.
///
/// One leading `/` is dropped. What is left is split on `/`, so a trailing
/// slash yields a trailing empty segment, while `""` and `/` yield none and
/// address the node they are applied to.
pub(crate) fn split(path: &str) -> impl Iterator<Item = &str> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    (!rest.is_empty()).then(|| rest.split('/')).into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_prefix() {
        assert!(matches!(Segment::parse("info"), Ok(Segment::Exact(s)) if s == "info"));
        assert!(matches!(Segment::parse(":id"), Ok(Segment::Wildcard(s)) if s == "id"));
        assert!(matches!(Segment::parse("#[a-z]+"), Ok(Segment::Regex(p)) if p.source() == "[a-z]+"));
    }

    #[test]
    fn rejects_broken_regex() {
        assert!(Segment::parse("#[a-z").is_err());
    }

    #[test]
    fn regex_must_cover_whole_segment() {
        let pattern = Pattern::compile("[a-z]").unwrap();
        let mut params = HashMap::new();
        assert!(pattern.capture("a", &mut params));
        assert!(!pattern.capture("abc", &mut params));
        assert!(!pattern.capture("1a", &mut params));
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let pattern = Pattern::compile("foo|bar").unwrap();
        let mut params = HashMap::new();
        assert!(pattern.capture("bar", &mut params));
        assert!(!pattern.capture("foobar", &mut params));
    }

    #[test]
    fn named_groups_become_params() {
        let pattern = Pattern::compile(r"(?P<name>[a-z]+)-(?P<rev>\d+)(?P<ext>\.bin)?").unwrap();
        let mut params = HashMap::new();
        assert!(pattern.capture("tool-12", &mut params));
        assert_eq!(params.get("name").map(String::as_str), Some("tool"));
        assert_eq!(params.get("rev").map(String::as_str), Some("12"));
        assert!(!params.contains_key("ext"));
    }

    #[test]
    fn failed_match_binds_nothing() {
        let pattern = Pattern::compile(r"(?P<n>\d+)").unwrap();
        let mut params = HashMap::new();
        assert!(!pattern.capture("abc", &mut params));
        assert!(params.is_empty());
    }

    #[test]
    fn split_drops_one_leading_slash() {
        assert_eq!(split("/customer/42").collect::<Vec<_>>(), ["customer", "42"]);
        assert_eq!(split("/a/").collect::<Vec<_>>(), ["a", ""]);
        assert_eq!(split("api").collect::<Vec<_>>(), ["api"]);
    }

    #[test]
    fn empty_and_root_paths_have_no_segments() {
        assert_eq!(split("").count(), 0);
        assert_eq!(split("/").count(), 0);
        assert_eq!(split("//").collect::<Vec<_>>(), [""]);
    }
}
