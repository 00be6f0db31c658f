//! Error taxonomy of the request pipeline.
//!
//! Client-facing failures are [`ApiError`]s: an [`ErrorKind`] (which fixes the HTTP status),
//! a message and a vendor-specific sub-code. Programmer errors (a route pointing at a
//! handler that was never registered, a controller method that forgot to validate) are
//! the configuration variants of [`MetalError`]. Both reach the client through the same
//! [`ErrorEnvelope`].

use http::StatusCode;
use metal_http::protocol::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    RequestTimeout,
    UnprocessableEntity,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not found",
            ErrorKind::MethodNotAllowed => "Method not allowed",
            ErrorKind::NotAcceptable => "Not acceptable",
            ErrorKind::RequestTimeout => "Request timeout",
            ErrorKind::UnprocessableEntity => "Unprocessable entity",
            ErrorKind::InternalServerError => "Internal server error",
            ErrorKind::ServiceUnavailable => "Service unavailable",
        }
    }
}

/// A client-facing failure carrying its HTTP status through its [`ErrorKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    code: i64,
}

macro_rules! api_error_constructor {
    ($fn_name:ident, $kind:ident) => {
        #[doc = concat!("Creates an [`ErrorKind::", stringify!($kind), "`] error.")]
        #[inline]
        pub fn $fn_name<S: Into<String>>(message: S) -> Self {
            Self::new(ErrorKind::$kind, message)
        }
    };
}

impl ApiError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self { kind, message: message.into(), code: 0 }
    }

    /// An error of `kind` carrying that kind's default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    api_error_constructor!(bad_request, BadRequest);
    api_error_constructor!(unauthorized, Unauthorized);
    api_error_constructor!(forbidden, Forbidden);
    api_error_constructor!(not_found, NotFound);
    api_error_constructor!(method_not_allowed, MethodNotAllowed);
    api_error_constructor!(not_acceptable, NotAcceptable);
    api_error_constructor!(request_timeout, RequestTimeout);
    api_error_constructor!(unprocessable_entity, UnprocessableEntity);
    api_error_constructor!(internal_server_error, InternalServerError);
    api_error_constructor!(service_unavailable, ServiceUnavailable);

    /// Attaches an internal, vendor-specific sub-code.
    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

impl From<ParseError> for ApiError {
    fn from(e: ParseError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum MetalError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{reason}")]
    RouterConfig { reason: String },

    #[error("{reason}")]
    ControllerConfig { reason: String },

    #[error("serialize error: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

impl MetalError {
    pub fn router_config<S: ToString>(reason: S) -> Self {
        Self::RouterConfig { reason: reason.to_string() }
    }

    pub fn controller_config<S: ToString>(reason: S) -> Self {
        Self::ControllerConfig { reason: reason.to_string() }
    }

    /// The kind this error is reported as; everything that is not an [`ApiError`]
    /// is an internal server error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetalError::Api(e) => e.kind(),
            _ => ErrorKind::InternalServerError,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    pub fn internal_code(&self) -> i64 {
        match self {
            MetalError::Api(e) => e.code(),
            _ => 0,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            errors: vec![ErrorObject {
                status: self.status().as_u16(),
                detail: self.to_string(),
                code: self.internal_code(),
            }],
        }
    }
}

impl From<ParseError> for MetalError {
    fn from(e: ParseError) -> Self {
        MetalError::Api(e.into())
    }
}

/// The standard error body: `{"errors":[{"status":404,"detail":"...","code":0}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub errors: Vec<ErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub status: u16,
    pub detail: String,
    pub code: i64,
}

impl From<ErrorEnvelope> for Value {
    fn from(envelope: ErrorEnvelope) -> Self {
        let errors = envelope
            .errors
            .into_iter()
            .map(|e| json!({ "status": e.status, "detail": e.detail, "code": e.code }))
            .collect::<Vec<_>>();
        json!({ "errors": errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_carry_status() {
        let cases = [
            (ErrorKind::BadRequest, 400, "Bad request"),
            (ErrorKind::Unauthorized, 401, "Unauthorized"),
            (ErrorKind::Forbidden, 403, "Forbidden"),
            (ErrorKind::NotFound, 404, "Not found"),
            (ErrorKind::MethodNotAllowed, 405, "Method not allowed"),
            (ErrorKind::NotAcceptable, 406, "Not acceptable"),
            (ErrorKind::RequestTimeout, 408, "Request timeout"),
            (ErrorKind::UnprocessableEntity, 422, "Unprocessable entity"),
            (ErrorKind::InternalServerError, 500, "Internal server error"),
            (ErrorKind::ServiceUnavailable, 503, "Service unavailable"),
        ];

        for (kind, status, message) in cases {
            let e = ApiError::from_kind(kind);
            assert_eq!(e.status().as_u16(), status);
            assert_eq!(e.message(), message);
            assert_eq!(e.code(), 0);
        }
    }

    #[test]
    fn sub_code() {
        let e = ApiError::service_unavailable("upstream down").with_code(1042);

        assert_eq!(e.kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(e.code(), 1042);

        let e = MetalError::from(e);
        assert_eq!(e.internal_code(), 1042);
        assert_eq!(
            e.envelope(),
            ErrorEnvelope { errors: vec![ErrorObject { status: 503, detail: "upstream down".into(), code: 1042 }] }
        );
    }

    #[test]
    fn config_errors_are_internal() {
        let e = MetalError::controller_config("Controller method getNumbers may not return without calling validate()");

        assert_eq!(e.kind(), ErrorKind::InternalServerError);
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(e.is_server_error());
        assert_eq!(e.to_string(), "Controller method getNumbers may not return without calling validate()");
    }

    #[test]
    fn parse_error_is_bad_request() {
        let e = MetalError::from(ParseError::InvalidMethod);

        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.to_string(), "invalid http method");
    }

    #[test]
    fn envelope_to_value() {
        let value = Value::from(MetalError::from(ApiError::not_found("The requested API method does not exist")).envelope());

        assert_eq!(
            value.to_string(),
            r#"{"errors":[{"status":404,"detail":"The requested API method does not exist","code":0}]}"#
        );
    }
}
