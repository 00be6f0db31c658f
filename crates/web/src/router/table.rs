use std::collections::HashMap;
use std::fmt;

use http::Method;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::MetalError;
use crate::params::Params;
use crate::router::Route;
use crate::router::pattern::{self, CompiledPattern};

type InnerRouter<T> = matchit::Router<T>;

/// The outcome of matching a method and path against the route table.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    NotFound,
    /// The path matched, the method did not; carries the methods the path accepts.
    MethodNotAllowed(Vec<Method>),
    Found { handler: String, params: Params },
}

/// Matches a request method and path to a route.
#[cfg_attr(test, mockall::automock)]
pub trait PathMatcher: Send + Sync {
    fn dispatch(&self, method: &Method, path: &str) -> MatchOutcome;
}

/// An immutable table of routes backed by a `matchit` router.
pub struct RouteTable {
    inner_router: InnerRouter<Vec<RouteEntry>>,
    len: usize,
}

struct RouteEntry {
    method: Method,
    handler: String,
    names: Vec<String>,
    constraints: Vec<Option<Regex>>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PathMatcher for RouteTable {
    fn dispatch(&self, method: &Method, path: &str) -> MatchOutcome {
        let Ok(matched) = self.inner_router.at(path) else {
            trace!(path, "no route matches path");
            return MatchOutcome::NotFound;
        };

        let values = matched.params.iter().map(|(_, value)| value).collect::<Vec<_>>();
        let candidates = matched.value.iter().filter(|entry| entry.accepts(&values)).collect::<Vec<_>>();

        if candidates.is_empty() {
            trace!(path, "path matched but no route constraint accepts it");
            return MatchOutcome::NotFound;
        }

        let found = candidates
            .iter()
            .find(|entry| entry.method == method)
            .or_else(|| (method == Method::HEAD).then(|| candidates.iter().find(|entry| entry.method == Method::GET)).flatten());

        match found {
            Some(entry) => {
                debug!(%method, path, handler = entry.handler.as_str(), "route matched");
                MatchOutcome::Found { handler: entry.handler.clone(), params: entry.params(&values) }
            }
            None => {
                let mut allowed = Vec::<Method>::new();
                for entry in &candidates {
                    if !allowed.contains(&entry.method) {
                        allowed.push(entry.method.clone());
                    }
                }
                MatchOutcome::MethodNotAllowed(allowed)
            }
        }
    }
}

impl RouteEntry {
    fn accepts(&self, values: &[&str]) -> bool {
        self.constraints
            .iter()
            .zip(values)
            .all(|(constraint, value)| constraint.as_ref().is_none_or(|regex| regex.is_match(value)))
    }

    fn params(&self, values: &[&str]) -> Params {
        self.names.iter().cloned().zip(values.iter().map(|value| (*value).to_string())).collect()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable").field("len", &self.len).finish_non_exhaustive()
    }
}

/// Collects routes, then validates and compiles them all at once.
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use]
    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Builds the table.
    ///
    /// # Errors
    ///
    /// A router configuration error naming the offending route when a method is invalid,
    /// a pattern cannot be compiled or `matchit` rejects the path as conflicting.
    pub fn build(self) -> Result<RouteTable, MetalError> {
        let len = self.routes.len();
        let mut data = HashMap::<String, Vec<RouteEntry>>::new();
        let mut order = Vec::<String>::new();

        for route in self.routes {
            let method = Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())
                .map_err(|e| MetalError::router_config(format!("invalid method `{}` of route {}: {e}", route.method, route.path)))?;
            let CompiledPattern { path, names, constraints } = pattern::compile(&route.path)?;

            if !data.contains_key(&path) {
                order.push(path.clone());
            }
            data.entry(path).or_default().push(RouteEntry { method, handler: route.handler, names, constraints });
        }

        let mut inner_router = InnerRouter::new();
        for path in order {
            let Some(entries) = data.remove(&path) else { continue };
            inner_router
                .insert(path.as_str(), entries)
                .map_err(|e| MetalError::router_config(format!("failed to register route {path}: {e}")))?;
        }

        Ok(RouteTable { inner_router, len })
    }
}
