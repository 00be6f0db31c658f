//! The response of one request: status, body and format.

use bytes::Bytes;
use http::StatusCode;
use metal_http::protocol::{Format, response_head};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::error::MetalError;
use crate::xml;

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: Value,
    format: Format,
    xml_root: String,
    xml_declaration: bool,
}

impl Response {
    /// A `200` response with an empty json string body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            body: Value::String(String::new()),
            format: Format::default(),
            xml_root: xml::DEFAULT_ROOT.to_string(),
            xml_declaration: true,
        }
    }

    /// Sets the root element name and whether xml bodies start with a declaration.
    #[must_use]
    pub fn with_xml(mut self, root: impl Into<String>, declaration: bool) -> Self {
        self.xml_root = root.into();
        self.xml_declaration = declaration;
        self
    }

    /// A response carrying `err`.
    pub fn from_error(err: &MetalError) -> Self {
        let mut response = Self::new();
        response.set_error(err);
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Value>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Serializes `body` into the json value model.
    pub fn set_serialized_body<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<&mut Self, MetalError> {
        self.body = serde_json::to_value(body)?;
        Ok(self)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) -> &mut Self {
        self.format = format;
        self
    }

    /// Replaces status and body with the error and its envelope.
    pub fn set_error(&mut self, err: &MetalError) -> &mut Self {
        self.status = err.status();
        self.body = err.envelope().into();
        self
    }

    /// The body rendered in `format`.
    pub fn body_as(&self, format: Format) -> String {
        match format {
            Format::Json => self.body.to_string(),
            Format::Xml => xml::to_xml(&self.body, &self.xml_root, self.xml_declaration),
        }
    }

    /// The body rendered in the response format.
    pub fn body_string(&self) -> String {
        self.body_as(self.format)
    }

    /// Builds the http response with the fixed content type and cache policy.
    pub fn into_http(self) -> http::Response<Bytes> {
        let body = Bytes::from(self.body_string());

        response_head(self.status, self.format).body(body).unwrap_or_else(|e| {
            error!(cause = %e, "failed to build response, respond with status 500");
            let mut response = http::Response::new(Bytes::new());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
