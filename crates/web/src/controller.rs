//! The per-request controller instance.
//!
//! A [`Controller`] binds the [`RequestContext`] of one request to its [`Response`]. Controller
//! methods declare and validate their params through it, read them back, and return the
//! value that becomes the response body. A method that returns without having validated is
//! a programming error and is reported as such.

use std::sync::Arc;

use http::header::ACCEPT;
use metal_http::protocol::Format;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{ApiError, ErrorKind, MetalError};
use crate::handler::ControllerClass;
use crate::params::Params;
use crate::request::RequestContext;
use crate::response::Response;
use crate::validation::{Declarations, ValidateOptions, ValidationEngine, ValidatorCatalog};
use crate::xml;

/// Application-wide settings every controller shares.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub catalog: Arc<ValidatorCatalog>,
    /// The kind of error raised when validation fails.
    pub validation_error: ErrorKind,
    pub default_format: Format,
    pub xml_root: String,
    pub xml_declaration: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            catalog: Arc::new(ValidatorCatalog::new()),
            validation_error: ErrorKind::UnprocessableEntity,
            default_format: Format::default(),
            xml_root: xml::DEFAULT_ROOT.to_string(),
            xml_declaration: true,
        }
    }
}

#[derive(Debug)]
pub struct Controller {
    class: Arc<ControllerClass>,
    request: RequestContext,
    response: Response,
    settings: Arc<ControllerSettings>,
    params_validated: bool,
}

impl Controller {
    pub fn new(class: Arc<ControllerClass>, request: RequestContext, settings: Arc<ControllerSettings>) -> Self {
        let mut response = Response::new().with_xml(settings.xml_root.clone(), settings.xml_declaration);
        response.set_format(settings.default_format);

        Self { class, request, response, settings, params_validated: false }
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut RequestContext {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }

    pub fn is_validated(&self) -> bool {
        self.params_validated
    }

    /// Validates the request params against `declarations`, rejecting unknown params and
    /// writing resolved defaults back.
    pub fn validate(&mut self, declarations: &Declarations) -> Result<(), ApiError> {
        self.validate_with(declarations, ValidateOptions::default())
    }

    pub fn validate_with(&mut self, declarations: &Declarations, options: ValidateOptions) -> Result<(), ApiError> {
        let engine = ValidationEngine::new(&self.settings.catalog, self.settings.validation_error);
        engine.validate(self.request.params_mut(), declarations, options)?;
        self.params_validated = true;
        Ok(())
    }

    /// A param by name; an explicit `null` reads as absent.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.request.param(name)
    }

    pub fn params(&self) -> &Params {
        self.request.params()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// A param read as an integer, whether it was sent as a number or as a string.
    pub fn int_param(&self, name: &str) -> Option<i64> {
        match self.param(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).and_then(float_to_int)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A param read as a float, whether it was sent as a number or as a string.
    pub fn float_param(&self, name: &str) -> Option<f64> {
        match self.param(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
            _ => None,
        }
    }

    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    /// Picks the response format from the `Accept` header.
    ///
    /// # Errors
    ///
    /// A `NotAcceptable` error when the header accepts neither json nor xml.
    pub fn negotiate_format(&mut self) -> Result<Format, ApiError> {
        let accept = self.request.header(ACCEPT.as_str());

        match Format::negotiate(accept, self.settings.default_format) {
            Some(format) => {
                self.response.set_format(format);
                Ok(format)
            }
            None => Err(ApiError::not_acceptable(
                "Not acceptable; not one of: [application/json, application/xml]",
            )),
        }
    }

    /// Runs the controller method `method_name` and stores its outcome in the response.
    ///
    /// The return value becomes the response body. Any error, including a method that
    /// returned without validating, becomes an error response instead; nothing is
    /// propagated to the caller.
    pub fn fulfill(&mut self, method_name: &str) -> &mut Self {
        match self.invoke(method_name) {
            Ok(body) => {
                self.response.set_body(body);
            }
            Err(e) => {
                if e.is_server_error() {
                    error!(controller = self.class.name(), method = method_name, cause = %e, "controller method failed");
                } else {
                    warn!(controller = self.class.name(), method = method_name, cause = %e, "controller method rejected request");
                }
                self.response.set_error(&e);
            }
        }
        self
    }

    fn invoke(&mut self, method_name: &str) -> Result<Value, MetalError> {
        let class = Arc::clone(&self.class);
        let method = class.get_method(method_name).ok_or_else(|| {
            MetalError::controller_config(format!(
                "Controller method `{method_name}` does not exist on controller {}",
                class.name()
            ))
        })?;

        let body = method.invoke(self)?;

        if !self.params_validated {
            return Err(MetalError::controller_config(format!(
                "Controller method `{method_name}` may not return without calling validate()"
            )));
        }

        Ok(body)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, reason = "the value is integral and checked against the i64 range")]
fn float_to_int(f: f64) -> Option<i64> {
    ((i64::MIN as f64)..(i64::MAX as f64)).contains(&f).then_some(f as i64)
}
