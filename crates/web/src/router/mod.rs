//! Route declarations and their resolution to a controller method.
//!
//! Routes are `(method, pattern, "Class#method")` triples. They are compiled once into a
//! [`RouteTable`] and never change afterwards; the [`RouteResolver`] turns the outcome of a
//! match into a [`HandlerDescriptor`] or a routing error.

mod pattern;
mod resolver;
mod table;

pub use resolver::RouteResolver;
pub use table::{MatchOutcome, PathMatcher, RouteTable, RouteTableBuilder};

#[cfg(test)]
pub(crate) use table::MockPathMatcher;

use serde::{Deserialize, Serialize};

use crate::params::Params;

/// The separator between class and method in a handler string.
pub const HANDLER_SEPARATOR: char = '#';

/// A route as declared in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub path: String,
    pub handler: String,
}

macro_rules! method_route {
    ($fn_name:ident, $method:literal) => {
        #[doc = concat!("A `", $method, "` route.")]
        pub fn $fn_name(path: impl Into<String>, handler: impl Into<String>) -> Self {
            Self::new($method, path, handler)
        }
    };
}

impl Route {
    pub fn new(method: impl Into<String>, path: impl Into<String>, handler: impl Into<String>) -> Self {
        Self { method: method.into(), path: path.into(), handler: handler.into() }
    }

    method_route!(get, "GET");
    method_route!(post, "POST");
    method_route!(put, "PUT");
    method_route!(patch, "PATCH");
    method_route!(delete, "DELETE");
    method_route!(head, "HEAD");
    method_route!(options, "OPTIONS");
}

/// The controller class and method a request resolved to, plus the params the route matched.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerDescriptor {
    class: String,
    method: String,
    route_params: Params,
}

impl HandlerDescriptor {
    /// Splits `handler` on its first `#`.
    ///
    /// Nothing is rejected here: a missing separator leaves the method empty and an empty
    /// handler leaves both empty, which the resolver reports.
    pub fn parse(handler: &str, route_params: Params) -> Self {
        let (class, method) = handler.split_once(HANDLER_SEPARATOR).unwrap_or((handler, ""));
        Self { class: class.trim().to_string(), method: method.trim().to_string(), route_params }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn route_params(&self) -> &Params {
        &self.route_params
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn route_helpers() {
        assert_eq!(Route::get("/a", "A#a"), Route::new("GET", "/a", "A#a"));
        assert_eq!(Route::options("/a", "A#a").method, "OPTIONS");
    }

    #[test]
    fn route_from_json() {
        let route: Route =
            serde_json::from_value(json!({"method": "GET", "path": "/numbers/{number}", "handler": "Numbers#getNumber"}))
                .unwrap();
        assert_eq!(route, Route::get("/numbers/{number}", "Numbers#getNumber"));
    }

    #[test]
    fn parse_descriptor() {
        let descriptor = HandlerDescriptor::parse("Numbers#getNumber", Params::from_iter([("number", "42")]));

        assert_eq!(descriptor.class(), "Numbers");
        assert_eq!(descriptor.method(), "getNumber");
        assert_eq!(descriptor.route_params().get("number"), Some(&json!("42")));
    }

    #[test]
    fn parse_splits_on_first_separator() {
        let descriptor = HandlerDescriptor::parse("A#b#c", Params::new());
        assert_eq!((descriptor.class(), descriptor.method()), ("A", "b#c"));
    }

    #[test]
    fn malformed_handlers() {
        let descriptor = HandlerDescriptor::parse("Numbers", Params::new());
        assert_eq!((descriptor.class(), descriptor.method()), ("Numbers", ""));

        let descriptor = HandlerDescriptor::parse("#get", Params::new());
        assert_eq!((descriptor.class(), descriptor.method()), ("", "get"));

        let descriptor = HandlerDescriptor::parse("", Params::new());
        assert_eq!((descriptor.class(), descriptor.method()), ("", ""));
    }
}
