//! HTTP Basic authentication credentials.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderValue;
use http::header::{AUTHORIZATION, HeaderName};
use serde::{Deserialize, Serialize};

const BASIC_SCHEME: &str = "Basic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuthCredential {
    user: String,
    password: String,
}

impl BasicAuthCredential {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self { user: user.into(), password: password.into() }
    }

    /// Decodes a credential from an `Authorization` value.
    ///
    /// The `Basic ` prefix is optional. Returns `None` when the value is not valid
    /// base64 or does not decode to `user:password`.
    pub fn from_header_value(value: &str) -> Option<Self> {
        let encoded = value.trim().strip_prefix(BASIC_SCHEME).map_or(value, str::trim_start).trim();
        let decoded = STANDARD.decode(encoded).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (user, password) = decoded.split_once(':')?;

        Some(Self::new(user, password))
    }

    /// Whether `value` looks like a Basic `Authorization` value.
    pub fn is_basic_auth(value: &str) -> bool {
        value.contains(BASIC_SCHEME)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// `[user, password]`
    pub fn to_flat(&self) -> [&str; 2] {
        [self.user.as_str(), self.password.as_str()]
    }

    /// `[("user", user), ("password", password)]`, keyed the way the credential serializes.
    pub fn to_map(&self) -> [(&'static str, &str); 2] {
        [("user", self.user.as_str()), ("password", self.password.as_str())]
    }

    pub fn encoded_credential(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.user, self.password))
    }

    pub fn encoded_header_value(&self) -> String {
        format!("{BASIC_SCHEME} {}", self.encoded_credential())
    }

    /// The full `Authorization` header carrying this credential.
    pub fn encoded_header(&self) -> Option<(HeaderName, HeaderValue)> {
        HeaderValue::from_str(&self.encoded_header_value()).ok().map(|value| (AUTHORIZATION, value))
    }

    pub fn is_match(&self, other: &BasicAuthCredential) -> bool {
        self == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_without_scheme() {
        let credential = BasicAuthCredential::from_header_value(
            "Y29uc3VtZXJhcGk6enpXVXdycUJzSlh4VHNqQ0RGUzIzVXNZMzU5YXJFczVEeVNheklB",
        )
        .unwrap();

        assert_eq!(credential.user(), "consumerapi");
        assert_eq!(credential.password(), "zzWUwrqBsJXxTsjCDFS23UsY359arEs5DySazIA");
    }

    #[test]
    fn decode_with_scheme() {
        let credential = BasicAuthCredential::from_header_value("Basic dXNlcjpwYXNzd29yZA==").unwrap();

        assert_eq!(credential, BasicAuthCredential::new("user", "password"));
    }

    #[test]
    fn decode_garbage() {
        assert!(BasicAuthCredential::from_header_value("Basic dslkadsjadsf;kafd").is_none());
        // valid base64, but no separator
        assert!(BasicAuthCredential::from_header_value("Basic dXNlcg==").is_none());
    }

    #[test]
    fn password_may_contain_colons() {
        let credential = BasicAuthCredential::new("user", "pa:ss");
        let decoded = BasicAuthCredential::from_header_value(&credential.encoded_header_value()).unwrap();

        assert_eq!(decoded.password(), "pa:ss");
    }

    #[test]
    fn is_basic_auth() {
        assert!(BasicAuthCredential::is_basic_auth("Basic: I'm a basic auth string"));
        assert!(!BasicAuthCredential::is_basic_auth("not a basic auth string"));
        assert!(!BasicAuthCredential::is_basic_auth("Bearer abc"));
    }

    #[test]
    fn encode() {
        let credential = BasicAuthCredential::new("user", "password");

        assert_eq!(credential.encoded_credential(), "dXNlcjpwYXNzd29yZA==");
        assert_eq!(credential.encoded_header_value(), "Basic dXNlcjpwYXNzd29yZA==");

        let (name, value) = credential.encoded_header().unwrap();
        assert_eq!(name, AUTHORIZATION);
        assert_eq!(value, "Basic dXNlcjpwYXNzd29yZA==");
    }

    #[test]
    fn views() {
        let credential = BasicAuthCredential::new("user", "password");

        assert_eq!(credential.to_flat(), ["user", "password"]);
        assert_eq!(credential.to_map(), [("user", "user"), ("password", "password")]);
    }

    #[test]
    fn matching() {
        let a = BasicAuthCredential::new("user", "password");
        assert!(a.is_match(&BasicAuthCredential::new("user", "password")));
        assert!(!a.is_match(&BasicAuthCredential::new("user", "other")));
    }
}
