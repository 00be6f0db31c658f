//! Request metadata as handed over by the host.
//!
//! [`RequestHead`] normalizes the three shapes a host may supply:
//! - CGI-style server variables (`REQUEST_METHOD`, `REQUEST_URI`, `HTTP_*`)
//! - an already parsed [`http::Request`]
//! - a raw HTTP/1.x request head, parsed with `httparse`
//!
//! Whatever the source, the path is the URI with its query string stripped and
//! percent-decoded, and headers are looked up case-insensitively.

use http::request::Parts;
use http::{Method, Request};
use httparse::{Error, Status};
use tracing::trace;

use crate::ensure;
use crate::protocol::{HeaderBag, ParseError};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
const MAX_HEADER_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    uri: String,
    path: String,
    headers: HeaderBag,
    authority: Option<String>,
    secure: bool,
}

impl RequestHead {
    pub fn new(method: Method, uri: impl Into<String>, headers: HeaderBag) -> Self {
        let uri = uri.into();
        let path = decode_path(&uri);
        let authority = headers.get(http::header::HOST.as_str()).map(str::to_string);
        Self { method, uri, path, headers, authority, secure: false }
    }

    /// Builds the head from CGI-style server variables.
    ///
    /// `REQUEST_METHOD` is mandatory; a missing `REQUEST_URI` is treated as an empty URI.
    /// The authority used by [`RequestHead::url`] comes from `SERVER_NAME`/`SERVER_PORT`,
    /// and the scheme from `HTTPS=on` or `X-Forwarded-Proto: https`.
    pub fn from_server_vars<I, K, V>(vars: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect::<Vec<_>>();
        let var = |name: &str| vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        let method = var("REQUEST_METHOD").ok_or(ParseError::missing_server_var("REQUEST_METHOD"))?;
        let method = Method::from_bytes(method.as_bytes()).or(Err(ParseError::InvalidMethod))?;
        let uri = var("REQUEST_URI").unwrap_or_default();

        let headers = HeaderBag::from_server_vars(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut head = Self::new(method, uri, headers);
        head.secure = var("HTTPS") == Some("on");
        if let Some(server_name) = var("SERVER_NAME") {
            head.authority = Some(match var("SERVER_PORT") {
                Some(port) if port != "80" && port != "443" => format!("{server_name}:{port}"),
                _ => server_name.to_string(),
            });
        }

        Ok(head)
    }

    /// Parses a raw HTTP/1.x request head.
    ///
    /// Returns `Ok(None)` when `buf` does not yet hold a complete head, otherwise the
    /// parsed head together with the offset at which the body starts.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - The number of headers exceeds `MAX_HEADER_NUM`
    /// - The total header size exceeds `MAX_HEADER_BYTES`
    /// - The HTTP version is not supported
    /// - The method or headers are invalid
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>, ParseError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_result = req.parse(buf).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(body_offset) => {
                trace!(header_size = body_offset, "parsed request head");
                ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

                match req.version {
                    Some(0 | 1) => {}
                    // http2 and http3 currently not support
                    version => return Err(ParseError::InvalidVersion(version)),
                }

                let method = req.method.ok_or(ParseError::InvalidMethod)?;
                let method = Method::from_bytes(method.as_bytes()).or(Err(ParseError::InvalidMethod))?;
                let uri = req.path.ok_or(ParseError::InvalidUri)?;

                let mut bag = HeaderBag::new();
                for header in req.headers.iter() {
                    let value = std::str::from_utf8(header.value).map_err(ParseError::invalid_header)?;
                    bag.append(header.name, value)?;
                }

                Ok(Some((Self::new(method, uri, bag), body_offset)))
            }
            Status::Partial => {
                ensure!(buf.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(buf.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw request URI, query string included.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI path, query string stripped and percent-decoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    pub fn headers(&self) -> &HeaderBag {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderBag {
        &mut self.headers
    }

    pub fn is_secure(&self) -> bool {
        self.secure || self.headers.get("X-Forwarded-Proto") == Some("https")
    }

    /// The absolute url of this request, when the authority is known.
    pub fn url(&self) -> Option<String> {
        let scheme = if self.is_secure() { "https" } else { "http" };
        self.authority.as_ref().map(|authority| format!("{scheme}://{authority}{}", self.uri))
    }
}

impl From<Parts> for RequestHead {
    fn from(parts: Parts) -> Self {
        let uri = parts.uri.path_and_query().map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        let secure = parts.uri.scheme() == Some(&http::uri::Scheme::HTTPS);
        let authority = parts.uri.authority().map(ToString::to_string);

        let mut head = Self::new(parts.method, uri, HeaderBag::from(parts.headers));
        head.secure = secure;
        if authority.is_some() {
            head.authority = authority;
        }
        head
    }
}

impl<B> From<&Request<B>> for RequestHead {
    fn from(request: &Request<B>) -> Self {
        let mut builder = Request::builder().method(request.method().clone()).uri(request.uri().clone());
        if let Some(headers) = builder.headers_mut() {
            headers.clone_from(request.headers());
        }

        match builder.body(()) {
            Ok(request) => request.into_parts().0.into(),
            // the parts above were taken from a valid request
            Err(_) => Self::new(request.method().clone(), request.uri().to_string(), HeaderBag::new()),
        }
    }
}

/// Strips the query string and percent-decodes what is left.
fn decode_path(uri: &str) -> String {
    let path = uri.split_once('?').map_or(uri, |(path, _)| path);
    String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
}
