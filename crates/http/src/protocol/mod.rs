//! Transport-side protocol types.
//!
//! This module holds everything the pipeline needs from the host but does not want to
//! know the shape of:
//!
//! - **Request metadata** ([`request`]): [`RequestHead`] normalizes server variables,
//!   [`http::Request`] parts and raw HTTP/1.x heads into one method/uri/path/headers view
//! - **Headers** ([`header`]): [`HeaderBag`], case-insensitive header lookup
//! - **Responses** ([`response`]): [`Format`], the fixed header policy of [`response_head`]
//!   and HTTP/1.1 serialization with [`encode_response`]
//! - **Errors** ([`error`]): [`ParseError`]

mod header;
pub use header::HeaderBag;

mod request;
pub use request::RequestHead;

mod response;
pub use response::Format;
pub use response::{encode_response, response_head};

mod error;
pub use error::ParseError;
