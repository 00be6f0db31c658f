//! The application entry point.
//!
//! [`Metal`] owns everything that is fixed at startup: the compiled route table, the
//! registered controller classes and the settings controllers share. It runs the whole
//! pipeline for one request at a time and is `Send + Sync`, so a host can share one
//! instance between as many workers as it likes.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, HeaderValue};
use http::{Method, Request};
use metal_http::protocol::RequestHead;
use tracing::{error, info, warn};

use crate::config::MetalConfig;
use crate::controller::ControllerSettings;
use crate::error::{ApiError, MetalError};
use crate::handler::{ControllerClass, HandlerRegistry};
use crate::params::Params;
use crate::request::RequestContext;
use crate::response::Response;
use crate::router::{HandlerDescriptor, RouteResolver, RouteTable};
use crate::validation::ValidatorCatalog;

#[derive(Debug)]
pub struct MetalBuilder {
    config: MetalConfig,
    registry: HandlerRegistry,
    catalog: Option<ValidatorCatalog>,
}

impl MetalBuilder {
    fn new() -> Self {
        Self { config: MetalConfig::default(), registry: HandlerRegistry::new(), catalog: None }
    }

    #[must_use]
    pub fn config(mut self, config: MetalConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn class(mut self, class: ControllerClass) -> Self {
        self.registry.register(class);
        self
    }

    /// Replaces the built-in validator catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: ValidatorCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Compiles the routes and checks every handler they name against the registry.
    ///
    /// # Errors
    ///
    /// A router configuration error for the first route that cannot be compiled or that
    /// names a controller method which was not registered.
    pub fn build(self) -> Result<Metal, MetalError> {
        let Self { config, registry, catalog } = self;

        for route in &config.routes {
            let descriptor = HandlerDescriptor::parse(&route.handler, Params::new());
            registry.check(descriptor.class(), descriptor.method()).map_err(|e| {
                MetalError::router_config(format!("invalid handler `{}` of route {} {}: {e}", route.handler, route.method, route.path))
            })?;
        }

        let table = RouteTable::builder().routes(config.routes.iter().cloned()).build()?;
        let catalog = Arc::new(catalog.unwrap_or_default());
        let settings = Arc::new(config.controller_settings(catalog));

        info!(routes = table.len(), base_path = config.base_path.as_deref(), "metal application built");

        Ok(Metal { resolver: RouteResolver::new(table, config.base_path), registry, settings })
    }
}

#[derive(Debug)]
pub struct Metal {
    resolver: RouteResolver<RouteTable>,
    registry: HandlerRegistry,
    settings: Arc<ControllerSettings>,
}

impl Metal {
    pub fn builder() -> MetalBuilder {
        MetalBuilder::new()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Runs the pipeline for one request: resolve, instantiate, fulfill.
    ///
    /// Never fails; every error ends up as an error envelope in the returned response.
    pub fn handle(&self, mut request: RequestContext) -> Response {
        let descriptor = match self.resolver.resolve(&mut request) {
            Ok(descriptor) => descriptor,
            Err(e) => return self.error_response(&e),
        };

        let mut controller = match self.registry.instantiate(&descriptor, request, Arc::clone(&self.settings)) {
            Ok(controller) => controller,
            Err(e) => return self.error_response(&e),
        };

        controller.fulfill(descriptor.method());
        controller.into_response()
    }

    /// Runs the pipeline for an [`http::Request`], reading params from its query and body.
    pub fn handle_http<B: AsRef<[u8]>>(&self, request: &Request<B>) -> http::Response<Bytes> {
        self.respond(RequestContext::from_http(request).map_err(MetalError::from))
    }

    /// Runs the pipeline for a raw HTTP/1.x request.
    ///
    /// The body is whatever follows the head, cut to its `Content-Length` when one is sent.
    pub fn handle_raw(&self, buf: &[u8]) -> http::Response<Bytes> {
        let request = match RequestHead::parse(buf) {
            Ok(Some((head, body_offset))) => {
                let body = &buf[body_offset..];
                let body = match head.headers().get(CONTENT_LENGTH.as_str()).and_then(|len| len.trim().parse::<usize>().ok()) {
                    Some(len) => &body[..len.min(body.len())],
                    None => body,
                };
                RequestContext::with_body(head, body).map_err(MetalError::from)
            }
            Ok(None) => Err(ApiError::bad_request("incomplete request head").into()),
            Err(e) => Err(MetalError::from(e)),
        };
        self.respond(request)
    }

    fn respond(&self, request: Result<RequestContext, MetalError>) -> http::Response<Bytes> {
        let (is_head, response) = match request {
            Ok(request) => (request.method() == Method::HEAD, self.handle(request)),
            Err(e) => (false, self.error_response(&e)),
        };

        let mut response = response.into_http();
        if is_head {
            let len = HeaderValue::from(response.body().len());
            response.headers_mut().insert(CONTENT_LENGTH, len);
            *response.body_mut() = Bytes::new();
        }
        response
    }

    fn error_response(&self, e: &MetalError) -> Response {
        if e.is_server_error() {
            error!(cause = %e, "failed to handle request");
        } else {
            warn!(cause = %e, "rejected request");
        }

        let mut response = Response::new().with_xml(self.settings.xml_root.clone(), self.settings.xml_declaration);
        response.set_format(self.settings.default_format).set_error(e);
        response
    }
}
