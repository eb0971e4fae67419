//! Route table and lookup.
//!
//! # Responsibilities
//! - Store registered routes per method
//! - Look up the route for a (method, path) pair
//! - Return the matched route with its parameters, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact lookup via HashMap; exact routes always beat parameterized ones
//! - O(n) scan of parameterized routes in registration order, first match wins
//! - Duplicate exact paths (and duplicate parameterized shapes) are rejected

use std::collections::HashMap;

use axum::http::Method;

use crate::error::RouteError;
use crate::routing::matcher::{normalize_path, split_segments, PathParams, PathPattern};

/// A registered route.
#[derive(Debug)]
pub struct Route<H> {
    pub method: Method,
    pub pattern: PathPattern,
    pub handler: H,
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub params: PathParams,
}

impl<H> RouteMatch<'_, H> {
    pub fn handler(&self) -> &H {
        &self.route.handler
    }

    pub fn pattern(&self) -> &str {
        self.route.pattern.as_str()
    }
}

/// Two-tier route table: exact index plus ordered parameterized list.
#[derive(Debug)]
pub struct RouteTable<H> {
    exact: HashMap<Method, HashMap<String, Route<H>>>,
    dynamic: HashMap<Method, Vec<Route<H>>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            dynamic: HashMap::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Fails on an invalid pattern or a conflicting entry.
    pub fn insert(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        let pattern = PathPattern::parse(pattern)?;
        let conflict = || RouteError::Conflict {
            method: method.clone(),
            path: pattern.as_str().to_string(),
        };

        if pattern.is_exact() {
            let by_path = self.exact.entry(method.clone()).or_default();
            if by_path.contains_key(pattern.as_str()) {
                return Err(conflict());
            }
            tracing::debug!(method = %method, path = %pattern.as_str(), "Registered exact route");
            by_path.insert(
                pattern.as_str().to_string(),
                Route {
                    method,
                    pattern,
                    handler,
                },
            );
        } else {
            let list = self.dynamic.entry(method.clone()).or_default();
            if list.iter().any(|r| r.pattern.same_shape(&pattern)) {
                return Err(conflict());
            }
            tracing::debug!(method = %method, path = %pattern.as_str(), "Registered parameterized route");
            list.push(Route {
                method,
                pattern,
                handler,
            });
        }
        Ok(())
    }

    /// Find the route for `method` and `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        let path = normalize_path(path);

        // 1. Exact index
        if let Some(route) = self.exact.get(method).and_then(|m| m.get(path)) {
            return Some(RouteMatch {
                route,
                params: PathParams::new(),
            });
        }

        // 2. Parameterized scan, registration order
        let segments = split_segments(path);
        self.dynamic.get(method)?.iter().find_map(|route| {
            route
                .pattern
                .matches(&segments)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// Methods that have some route matching `path`.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .exact
            .keys()
            .chain(self.dynamic.keys())
            .filter(|m| self.lookup(m, path).is_some())
            .cloned()
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods.dedup();
        methods
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.exact.values().map(HashMap::len).sum::<usize>()
            + self.dynamic.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/", "home").unwrap();
        table.insert(Method::GET, "/about", "about").unwrap();

        let m = table.lookup(&Method::GET, "/about/").unwrap();
        assert_eq!(*m.handler(), "about");
        assert!(m.params.is_empty());

        assert_eq!(*table.lookup(&Method::GET, "/").unwrap().handler(), "home");
        assert!(table.lookup(&Method::POST, "/about").is_none());
    }

    #[test]
    fn test_exact_beats_parameterized() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/:page", "dynamic").unwrap();
        table.insert(Method::GET, "/about", "exact").unwrap();

        assert_eq!(*table.lookup(&Method::GET, "/about").unwrap().handler(), "exact");

        let m = table.lookup(&Method::GET, "/contact").unwrap();
        assert_eq!(*m.handler(), "dynamic");
        assert_eq!(m.params.get("page"), Some("contact"));
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/users/:id", "user").unwrap();
        table.insert(Method::GET, "/:section/new", "new").unwrap();

        // Both patterns match; the first registered wins.
        let m = table.lookup(&Method::GET, "/users/new").unwrap();
        assert_eq!(*m.handler(), "user");
        assert_eq!(m.params.get("id"), Some("new"));
    }

    #[test]
    fn test_conflicts_rejected() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/about", 1).unwrap();
        let err = table.insert(Method::GET, "/about/", 2).unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));

        table.insert(Method::GET, "/users/:id", 3).unwrap();
        assert!(table.insert(Method::GET, "/users/:name", 4).is_err());

        // Same path under another method is fine.
        table.insert(Method::POST, "/about", 5).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_no_match() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/users/:id", ()).unwrap();
        assert!(table.lookup(&Method::GET, "/users").is_none());
        assert!(table.lookup(&Method::GET, "/users/1/2").is_none());
    }

    #[test]
    fn test_allowed_methods() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/items/:id", ()).unwrap();
        table.insert(Method::DELETE, "/items/:id", ()).unwrap();
        table.insert(Method::POST, "/items", ()).unwrap();

        assert_eq!(
            table.allowed_methods("/items/7"),
            vec![Method::DELETE, Method::GET]
        );
        assert_eq!(table.allowed_methods("/items"), vec![Method::POST]);
    }
}
