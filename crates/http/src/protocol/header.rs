//! Case-insensitive request header storage.
//!
//! Hosts hand headers over in one of two shapes: a structured header list (a parsed
//! HTTP/1.x head, an [`http::HeaderMap`]) or CGI-style server variables where every
//! header is flattened to `HTTP_SOME_NAME`. [`HeaderBag`] accepts both and always
//! answers lookups regardless of the casing used by the transport or the caller.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use crate::protocol::ParseError;

const SERVER_VAR_HEADER_PREFIX: &str = "HTTP_";

/// CGI passes these two without the `HTTP_` marker.
const UNPREFIXED_SERVER_VAR_HEADERS: [(&str, &str); 2] =
    [("CONTENT_TYPE", "Content-Type"), ("CONTENT_LENGTH", "Content-Length")];

#[derive(Debug, Clone, Default)]
pub struct HeaderBag {
    inner: HeaderMap,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds `Key-Name: value` headers from environment-style `HTTP_KEY_NAME` variables.
    ///
    /// Variables without the header marker are ignored, as are names that do not form a
    /// valid header name once underscores are turned into dashes.
    pub fn from_server_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut bag = Self::new();

        for (key, value) in vars {
            let key = key.as_ref();
            let name = match key.strip_prefix(SERVER_VAR_HEADER_PREFIX) {
                Some(stripped) => server_var_to_header_name(stripped),
                None => match UNPREFIXED_SERVER_VAR_HEADERS.iter().find(|(var, _)| *var == key) {
                    Some((_, header)) => (*header).to_string(),
                    None => continue,
                },
            };

            if let Err(e) = bag.append(&name, value.as_ref()) {
                warn!(server_var = key, cause = %e, "skip server variable which is not a valid header");
            }
        }

        bag
    }

    pub fn append(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_str(value).map_err(ParseError::invalid_header)?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Replaces any previous value stored under `name`.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_str(value).map_err(ParseError::invalid_header)?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Looks a header up by name, ignoring case.
    ///
    /// Values that are not visible ASCII are reported as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over `(lowercase name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)))
    }

    pub fn as_header_map(&self) -> &HeaderMap {
        &self.inner
    }
}

impl From<HeaderMap> for HeaderBag {
    fn from(inner: HeaderMap) -> Self {
        Self { inner }
    }
}

/// `X_TEST_KEY` -> `X-Test-Key`
fn server_var_to_header_name(var: &str) -> String {
    var.split(['_', '-'])
        .map(|piece| {
            let mut chars = piece.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
