//! Transport-side plumbing for the metal api framework.
//!
//! This crate turns whatever the host hands over (CGI-style server variables, an
//! [`http::Request`], or a raw HTTP/1.x request head) into a single normalized
//! [`protocol::RequestHead`], and provides the pieces needed on the way out: the
//! response [`protocol::Format`] and the fixed response header policy.
//!
//! # Example
//!
//! ```
//! use metal_http::protocol::RequestHead;
//!
//! let raw = b"GET /numbers/42?favorite=1 HTTP/1.1\r\nHost: localhost\r\nX-Test: v\r\n\r\n";
//! let (head, _body_offset) = RequestHead::parse(raw).unwrap().unwrap();
//!
//! assert_eq!(head.path(), "/numbers/42");
//! assert_eq!(head.query(), Some("favorite=1"));
//! assert_eq!(head.headers().get("x-test"), Some("v"));
//! ```
//!
//! # Modules
//!
//! - [`protocol`]: request heads, headers, formats and parse errors
//! - [`auth`]: HTTP Basic credentials

pub mod auth;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
