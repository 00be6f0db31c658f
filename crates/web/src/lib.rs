//! A minimal API micro framework.
//!
//! A request travels one synchronous pipeline: the [`router`] matches it to a
//! `Class#method` handler, the [`handler`] registry instantiates that controller, the
//! controller declares and [`validation`]-checks its params and returns a value, and the
//! [`Response`] renders that value (or the error that stopped it) as json or [`xml`].
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use metal_web::handler::method_fn;
//! use metal_web::router::Route;
//! use metal_web::validation::{Declarations, ParamSpec};
//! use metal_web::{Controller, ControllerClass, Metal, MetalConfig};
//!
//! let numbers = ControllerClass::new("Numbers").method(
//!     "getNumber",
//!     method_fn(|controller: &mut Controller| {
//!         controller.validate(&Declarations::new().param("number", ParamSpec::required().with_type("int")))?;
//!         Ok(serde_json::json!({ "number": controller.int_param("number") }))
//!     }),
//! );
//!
//! let metal = Metal::builder()
//!     .config(MetalConfig::new().route(Route::get("/numbers/{number}", "Numbers#getNumber")))
//!     .class(numbers)
//!     .build()
//!     .unwrap();
//!
//! let response = metal.handle_http(&Request::get("/numbers/42").body(Bytes::new()).unwrap());
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), br#"{"number":42}"#);
//! ```

mod config;
mod controller;
mod error;
mod params;
mod request;
mod response;
mod server;

pub mod handler;
pub mod router;
pub mod validation;
pub mod xml;

pub use config::MetalConfig;
pub use controller::{Controller, ControllerSettings};
pub use error::{ApiError, ErrorEnvelope, ErrorKind, ErrorObject, MetalError};
pub use handler::{ControllerClass, HandlerRegistry, method_fn};
pub use params::Params;
pub use request::RequestContext;
pub use response::Response;
pub use router::Route;
pub use server::{Metal, MetalBuilder};

pub use metal_http::protocol::Format;
