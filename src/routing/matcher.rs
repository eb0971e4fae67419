//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse `/users/:id` style patterns into literal and parameter segments
//! - Normalize request paths (trailing slash)
//! - Match a split path against a pattern, extracting parameters
//!
//! # Design Decisions
//! - A parameter captures exactly one segment; no multi-segment wildcard
//! - Literal segments compare case-sensitively
//! - No regex: matching is a segment-by-segment comparison, O(segments)
//! - Parameter values are the raw (still percent-encoded) segment text

use std::collections::BTreeMap;

use crate::error::RouteError;

/// Marks a parameter segment in a pattern.
pub const PARAM_MARKER: char = ':';

/// Strip trailing slashes, keeping the root path `/`.
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Split a normalized path into segments. The root path has none.
pub fn split_segments(path: &str) -> Vec<&str> {
    if path == "/" {
        return Vec::new();
    }
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

/// Path parameters extracted by a match, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern such as `/users/:id/posts`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("pattern must start with `/`"));
        }

        let normalized = normalize_path(pattern);
        let mut segments = Vec::new();
        for raw in split_segments(normalized) {
            match raw.strip_prefix(PARAM_MARKER) {
                Some("") => return Err(invalid("parameter segment has no name")),
                Some(name) => {
                    let duplicate = segments
                        .iter()
                        .any(|s| matches!(s, Segment::Param(n) if n == name));
                    if duplicate {
                        return Err(invalid("duplicate parameter name"));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                None => segments.push(Segment::Literal(raw.to_string())),
            }
        }

        Ok(Self {
            source: normalized.to_string(),
            segments,
        })
    }

    /// The normalized pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern has no parameter segments.
    pub fn is_exact(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Two patterns with the same shape match exactly the same paths.
    pub fn same_shape(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    _ => false,
                })
    }

    /// Match pre-split path segments, returning the captured parameters.
    pub fn matches(&self, path: &[&str]) -> Option<PathParams> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(lit) if lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.insert(name.as_str(), *value),
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/users//"), "/users");
        assert_eq!(normalize_path("/users"), "/users");
    }

    #[test]
    fn test_split_segments() {
        assert!(split_segments("/").is_empty());
        assert_eq!(split_segments("/users/42"), vec!["users", "42"]);
    }

    #[test]
    fn test_parse_exact_and_param() {
        let exact = PathPattern::parse("/about/").unwrap();
        assert!(exact.is_exact());
        assert_eq!(exact.as_str(), "/about");

        let dynamic = PathPattern::parse("/users/:id/posts/:post").unwrap();
        assert!(!dynamic.is_exact());
        assert_eq!(dynamic.param_names().collect::<Vec<_>>(), vec!["id", "post"]);
    }

    #[test]
    fn test_parse_rejects_bad_patterns() {
        assert!(PathPattern::parse("users").is_err());
        assert!(PathPattern::parse("/users/:").is_err());
        assert!(PathPattern::parse("/a/:id/b/:id").is_err());
    }

    #[test]
    fn test_matches_extracts_params() {
        let pattern = PathPattern::parse("/users/:id").unwrap();
        let params = pattern.matches(&["users", "42"]).unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);

        assert!(pattern.matches(&["users"]).is_none());
        assert!(pattern.matches(&["users", "42", "x"]).is_none());
        assert!(pattern.matches(&["Users", "42"]).is_none());
    }

    #[test]
    fn test_same_shape() {
        let a = PathPattern::parse("/users/:id").unwrap();
        let b = PathPattern::parse("/users/:name").unwrap();
        let c = PathPattern::parse("/posts/:id").unwrap();
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }
}
