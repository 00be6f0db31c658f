use http::Method;
use tracing::debug;

use crate::error::{ApiError, MetalError};
use crate::request::RequestContext;
use crate::router::table::{MatchOutcome, PathMatcher, RouteTable};
use crate::router::HandlerDescriptor;

/// Resolves requests to the controller method their route names.
#[derive(Debug)]
pub struct RouteResolver<M = RouteTable> {
    matcher: M,
    base_path: Option<String>,
}

impl<M: PathMatcher> RouteResolver<M> {
    /// A resolver over `matcher`; requests whose uri does not contain `base_path` are
    /// rejected before the matcher sees them.
    pub fn new(matcher: M, base_path: Option<String>) -> Self {
        let base_path = base_path.filter(|base_path| !base_path.is_empty());
        Self { matcher, base_path }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Matches `request` and layers the matched route params over its params.
    ///
    /// # Errors
    ///
    /// `NotFound` and `MethodNotAllowed` api errors when nothing matches, a router
    /// configuration error when the matched handler string names no class or no method.
    pub fn resolve(&self, request: &mut RequestContext) -> Result<HandlerDescriptor, MetalError> {
        if let Some(base_path) = &self.base_path
            && !request.uri().contains(base_path.as_str())
        {
            debug!(uri = request.uri(), base_path = base_path.as_str(), "uri is outside of the base path");
            return Err(not_found().into());
        }

        let (handler, route_params) = match self.matcher.dispatch(request.method(), request.path()) {
            MatchOutcome::NotFound => return Err(not_found().into()),
            MatchOutcome::MethodNotAllowed(allowed) => return Err(method_not_allowed(&allowed).into()),
            MatchOutcome::Found { handler, params } => (handler, params),
        };

        let descriptor = HandlerDescriptor::parse(&handler, route_params);

        if descriptor.class().is_empty() {
            return Err(MetalError::router_config(format!(
                "Error getting matched controller for request: {}",
                request.path()
            )));
        }
        if descriptor.method().is_empty() {
            return Err(MetalError::router_config(format!(
                "Error getting matched controller method for controller: {} and request: {}",
                descriptor.class(),
                request.path()
            )));
        }

        request.merge_route_params(descriptor.route_params().clone());
        Ok(descriptor)
    }
}

fn not_found() -> ApiError {
    ApiError::not_found("The requested API method does not exist")
}

fn method_not_allowed(allowed: &[Method]) -> ApiError {
    let allowed = allowed.iter().map(Method::as_str).collect::<Vec<_>>();
    ApiError::method_not_allowed(format!("Method not allowed; not one of: [{}]", allowed.join(", ")))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use metal_http::protocol::{HeaderBag, RequestHead};
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::params::Params;
    use crate::router::{MockPathMatcher, Route};

    fn request(method: Method, uri: &str) -> RequestContext {
        RequestContext::from_head(RequestHead::new(method, uri, HeaderBag::new())).unwrap()
    }

    fn matcher_returning(outcome: MatchOutcome) -> MockPathMatcher {
        let mut matcher = MockPathMatcher::new();
        matcher.expect_dispatch().times(1).return_const(outcome);
        matcher
    }

    fn found(handler: &str, params: Params) -> MatchOutcome {
        MatchOutcome::Found { handler: handler.to_string(), params }
    }

    fn api_kind(e: &MetalError) -> Option<ErrorKind> {
        match e {
            MetalError::Api(api) => Some(api.kind()),
            _ => None,
        }
    }

    #[test]
    fn dispatches_method_and_path() {
        let mut matcher = MockPathMatcher::new();
        matcher
            .expect_dispatch()
            .withf(|method, path| method == Method::GET && path == "/numbers/42")
            .times(1)
            .return_const(found("Numbers#getNumber", Params::from_iter([("number", "42")])));
        let resolver = RouteResolver::new(matcher, None);
        let mut request = request(Method::GET, "/numbers/42?favorite=1");

        let descriptor = resolver.resolve(&mut request).unwrap();

        assert_eq!(descriptor.class(), "Numbers");
        assert_eq!(descriptor.method(), "getNumber");
        assert_eq!(request.param("number"), Some(&json!("42")));
        assert_eq!(request.param("favorite"), Some(&json!("1")));
    }

    #[test]
    fn route_params_override_request_params() {
        let resolver = RouteResolver::new(matcher_returning(found("Items#get", Params::from_iter([("id", "5")]))), None);
        let mut request = request(Method::GET, "/items/5?id=old&keep=1");

        resolver.resolve(&mut request).unwrap();

        assert_eq!(request.param("id"), Some(&json!("5")));
        assert_eq!(request.param("keep"), Some(&json!("1")));
    }

    #[test]
    fn not_found() {
        let resolver = RouteResolver::new(matcher_returning(MatchOutcome::NotFound), None);

        let e = resolver.resolve(&mut request(Method::GET, "/letters")).unwrap_err();

        assert_eq!(api_kind(&e), Some(ErrorKind::NotFound));
        assert_eq!(e.to_string(), "The requested API method does not exist");
    }

    #[test]
    fn method_not_allowed() {
        let resolver = RouteResolver::new(
            matcher_returning(MatchOutcome::MethodNotAllowed(vec![Method::GET, Method::POST])),
            None,
        );

        let e = resolver.resolve(&mut request(Method::DELETE, "/numbers")).unwrap_err();

        assert_eq!(e.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(e.to_string(), "Method not allowed; not one of: [GET, POST]");
    }

    #[test]
    fn base_path_precheck_skips_matcher() {
        let mut matcher = MockPathMatcher::new();
        matcher.expect_dispatch().never();
        let resolver = RouteResolver::new(matcher, Some("/api/v1".to_string()));

        let e = resolver.resolve(&mut request(Method::GET, "/numbers/42")).unwrap_err();

        assert_eq!(api_kind(&e), Some(ErrorKind::NotFound));
    }

    #[test]
    fn base_path_is_a_substring_check() {
        let resolver = RouteResolver::new(matcher_returning(found("A#a", Params::new())), Some("/api".to_string()));
        assert!(resolver.resolve(&mut request(Method::GET, "/v2/api/a")).is_ok());

        let resolver = RouteResolver::new(matcher_returning(found("A#a", Params::new())), Some(String::new()));
        assert_eq!(resolver.base_path(), None);
        assert!(resolver.resolve(&mut request(Method::GET, "/a")).is_ok());
    }

    #[test]
    fn empty_class() {
        let resolver = RouteResolver::new(matcher_returning(found("#get", Params::new())), None);

        let e = resolver.resolve(&mut request(Method::GET, "/numbers")).unwrap_err();

        assert!(matches!(e, MetalError::RouterConfig { .. }));
        assert_eq!(e.to_string(), "Error getting matched controller for request: /numbers");
    }

    #[test]
    fn empty_method() {
        let resolver = RouteResolver::new(matcher_returning(found("Numbers", Params::new())), None);

        let e = resolver.resolve(&mut request(Method::GET, "/numbers")).unwrap_err();

        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            e.to_string(),
            "Error getting matched controller method for controller: Numbers and request: /numbers"
        );
    }

    #[test]
    fn config_errors_leave_params_untouched() {
        let resolver = RouteResolver::new(matcher_returning(found("Numbers", Params::from_iter([("id", "5")]))), None);
        let mut request = request(Method::GET, "/numbers?id=1");

        assert!(resolver.resolve(&mut request).is_err());
        assert_eq!(request.param("id"), Some(&json!("1")));
    }

    #[test]
    fn over_route_table() {
        let table = RouteTable::builder()
            .route(Route::get("/api/numbers/{number}", "Numbers#getNumber"))
            .build()
            .unwrap();
        let resolver = RouteResolver::new(table, Some("/api".to_string()));
        let mut request = request(Method::HEAD, "/api/numbers/7");

        let descriptor = resolver.resolve(&mut request).unwrap();

        assert_eq!(descriptor.method(), "getNumber");
        assert_eq!(request.param("number"), Some(&json!("7")));
    }
}
