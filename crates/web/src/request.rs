//! The per-request context handed to controllers.
//!
//! A [`RequestContext`] bundles the normalized [`RequestHead`] with the merged parameter
//! bag. It is built once per inbound request; afterwards its params change only when the
//! matched route params are layered in and when validated defaults are written back.

use http::Request;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use metal_http::auth::BasicAuthCredential;
use metal_http::protocol::{HeaderBag, ParseError, RequestHead};
use mime::Mime;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::params::Params;

#[derive(Debug, Clone)]
pub struct RequestContext {
    head: RequestHead,
    params: Params,
}

impl RequestContext {
    pub fn new(head: RequestHead, params: Params) -> Self {
        Self { head, params }
    }

    /// Builds the context from a head alone, reading params from its query string.
    pub fn from_head(head: RequestHead) -> Result<Self, ApiError> {
        let params = head.query().map(Params::from_query).transpose()?.unwrap_or_default();
        Ok(Self::new(head, params))
    }

    /// Builds the context from CGI-style server variables and the raw parameter bag the
    /// host already merged from query and body.
    pub fn from_server_vars<I, K, V>(vars: I, params: Params) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(Self::new(RequestHead::from_server_vars(vars)?, params))
    }

    /// Builds the context from a full http request.
    ///
    /// Body params decoded from a JSON object or a form-urlencoded body are layered over
    /// the query params. Bodies of any other content type are ignored.
    pub fn from_http<B: AsRef<[u8]>>(request: &Request<B>) -> Result<Self, ApiError> {
        Self::with_body(RequestHead::from(request), request.body().as_ref())
    }

    /// Builds the context from a head and the raw body that followed it.
    pub fn with_body(head: RequestHead, body: &[u8]) -> Result<Self, ApiError> {
        let mut context = Self::from_head(head)?;
        let body_params = body_params(context.header(CONTENT_TYPE.as_str()), body)?;
        context.params.merge(body_params);
        Ok(context)
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &http::Method {
        self.head.method()
    }

    /// The request path, query string stripped and percent-decoded.
    pub fn path(&self) -> &str {
        self.head.path()
    }

    pub fn uri(&self) -> &str {
        self.head.uri()
    }

    pub fn url(&self) -> Option<String> {
        self.head.url()
    }

    pub fn headers(&self) -> &HeaderBag {
        self.head.headers()
    }

    /// Looks a header up by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers().get(name)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        self.head.headers_mut().insert(name, value)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A param by name; an explicit `null` reads as absent.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get_present(name)
    }

    /// Layers the matched route params over the request params.
    pub fn merge_route_params(&mut self, route_params: Params) {
        self.params.merge(route_params);
    }

    pub(crate) fn replace_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// The Basic-Auth credential carried by the `Authorization` header, if any.
    pub fn basic_auth_credential(&self) -> Option<BasicAuthCredential> {
        self.header(AUTHORIZATION.as_str())
            .filter(|value| BasicAuthCredential::is_basic_auth(value))
            .and_then(BasicAuthCredential::from_header_value)
    }

    /// The media ranges of the `Accept` header in the order they were sent, parameters stripped.
    pub fn accept_headers(&self) -> Vec<String> {
        self.header(ACCEPT.as_str())
            .map(|accept| {
                accept
                    .split(',')
                    .filter_map(|range| range.split(';').next())
                    .map(str::trim)
                    .filter(|range| !range.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first media range of the `Accept` header.
    pub fn accept_header(&self) -> Option<String> {
        self.accept_headers().into_iter().next()
    }
}

fn body_params(content_type: Option<&str>, body: &[u8]) -> Result<Params, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Params::new());
    }

    let Some(mime) = content_type.and_then(|content_type| content_type.parse::<Mime>().ok()) else {
        debug!(body_size = body.len(), "ignore request body without a usable content type");
        return Ok(Params::new());
    };

    if mime.type_() == mime::APPLICATION && (mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON)) {
        Params::from_json_body(body)
    } else if mime.type_() == mime::APPLICATION && mime.subtype() == mime::WWW_FORM_URLENCODED {
        Params::from_form_body(body)
    } else {
        debug!(content_type = %mime, "ignore request body of unsupported content type");
        Ok(Params::new())
    }
}
