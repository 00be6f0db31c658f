//! Application configuration.
//!
//! Everything the pipeline needs to know at startup lives in one [`MetalConfig`], built
//! either fluently or from JSON:
//!
//! ```
//! use metal_web::MetalConfig;
//!
//! let config = MetalConfig::from_json_str(r#"{
//!     "base_path": "/api",
//!     "routes": [
//!         {"method": "GET", "path": "/api/numbers/{number}", "handler": "Numbers#getNumber"}
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(config.routes.len(), 1);
//! assert_eq!(config.xml_root, "response");
//! ```

use std::sync::Arc;

use metal_http::protocol::Format;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerSettings;
use crate::error::ErrorKind;
use crate::router::Route;
use crate::validation::ValidatorCatalog;
use crate::xml;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetalConfig {
    /// Requests whose uri does not contain this are answered with `404` without routing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// The error raised when request params fail validation.
    pub validation_error: ErrorKind,

    /// The format of responses until a controller negotiates another one.
    pub default_format: Format,

    /// Root element name of xml bodies.
    pub xml_root: String,

    /// Whether xml bodies start with `<?xml ...?>`.
    pub xml_declaration: bool,

    pub routes: Vec<Route>,
}

impl Default for MetalConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            validation_error: ErrorKind::UnprocessableEntity,
            default_format: Format::Json,
            xml_root: xml::DEFAULT_ROOT.to_string(),
            xml_declaration: true,
            routes: vec![],
        }
    }
}

impl MetalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    #[must_use]
    pub fn validation_error(mut self, kind: ErrorKind) -> Self {
        self.validation_error = kind;
        self
    }

    #[must_use]
    pub fn default_format(mut self, format: Format) -> Self {
        self.default_format = format;
        self
    }

    #[must_use]
    pub fn xml_root(mut self, root: impl Into<String>) -> Self {
        self.xml_root = root.into();
        self
    }

    #[must_use]
    pub fn xml_declaration(mut self, declaration: bool) -> Self {
        self.xml_declaration = declaration;
        self
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

    /// The settings shared by every controller of the application.
    pub(crate) fn controller_settings(&self, catalog: Arc<ValidatorCatalog>) -> ControllerSettings {
        ControllerSettings {
            catalog,
            validation_error: self.validation_error,
            default_format: self.default_format,
            xml_root: self.xml_root.clone(),
            xml_declaration: self.xml_declaration,
        }
    }
}
