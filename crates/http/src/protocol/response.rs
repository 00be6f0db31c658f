//! Response formats and the fixed response header policy.
//!
//! Every response is sent with `Content-Type: application/<format>; charset=UTF-8` and
//! with caching disabled. These headers are not configurable.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES};
use http::response::Builder;
use http::{Response, StatusCode};
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::protocol::ParseError;

const CACHE_CONTROL_POLICY: &str = "no-cache, must-revalidate";
const EXPIRES_POLICY: &str = "-1";

/// Initial buffer size reserved for the status line and headers
const INIT_HEAD_SIZE: usize = 1024;

/// The serialization format of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    /// The full `Content-Type` value, e.g. `application/json; charset=UTF-8`.
    pub fn content_type(self) -> String {
        format!("application/{}; charset=UTF-8", self.as_str())
    }

    /// Picks a format from an `Accept` header.
    ///
    /// Media ranges are considered in the order they were sent; ranges with `q=0` are
    /// skipped. A missing or empty header, `*/*` and `application/*` resolve to `default`.
    /// Returns `None` when nothing the header accepts can be produced.
    pub fn negotiate(accept: Option<&str>, default: Format) -> Option<Format> {
        let Some(accept) = accept.map(str::trim).filter(|accept| !accept.is_empty()) else {
            return Some(default);
        };

        accept
            .split(',')
            .filter_map(|range| range.trim().parse::<Mime>().ok())
            .filter(|mime| mime.get_param("q").is_none_or(|q| q.as_str().parse::<f32>().map_or(true, |q| q > 0.0)))
            .find_map(|mime| Self::from_mime(&mime, default))
    }

    fn from_mime(mime: &Mime, default: Format) -> Option<Format> {
        let (type_, subtype, suffix) = (mime.type_(), mime.subtype(), mime.suffix());

        if subtype == mime::STAR && (type_ == mime::STAR || type_ == mime::APPLICATION) {
            Some(default)
        } else if type_ == mime::APPLICATION && (subtype == mime::JSON || suffix == Some(mime::JSON)) {
            Some(Format::Json)
        } else if (type_ == mime::APPLICATION || type_ == mime::TEXT)
            && (subtype == mime::XML || suffix == Some(mime::XML))
        {
            Some(Format::Xml)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "xml" => Ok(Format::Xml),
            _ => Err(ParseError::unsupported_format(s)),
        }
    }
}

/// Starts a response carrying the status, content type and cache-disabling headers.
pub fn response_head(status: StatusCode, format: Format) -> Builder {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, format.content_type())
        .header(CACHE_CONTROL, CACHE_CONTROL_POLICY)
        .header(EXPIRES, EXPIRES_POLICY)
}

/// Serializes `response` as an HTTP/1.1 message into `dst`.
///
/// A `Content-Length` matching the body is added unless the response already carries one,
/// as responses to `HEAD` do.
pub fn encode_response<B: AsRef<[u8]>>(response: &Response<B>, dst: &mut BytesMut) {
    let status = response.status();
    let body = response.body().as_ref();

    dst.reserve(INIT_HEAD_SIZE + body.len());
    dst.put_slice(b"HTTP/1.1 ");
    dst.put_slice(status.as_str().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(status.canonical_reason().unwrap_or("Unknown").as_bytes());
    dst.put_slice(b"\r\n");

    if !response.headers().contains_key(CONTENT_LENGTH) {
        dst.put_slice(CONTENT_LENGTH.as_str().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(body.len().to_string().as_bytes());
        dst.put_slice(b"\r\n");
    }

    for (name, value) in response.headers() {
        dst.put_slice(name.as_str().as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
    dst.put_slice(body);
}
