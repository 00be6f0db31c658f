use thiserror::Error;

/// Errors raised while turning raw transport data into a [`RequestHead`](super::RequestHead).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("missing server variable: {name}")]
    MissingServerVar { name: &'static str },

    #[error("unsupported response format: {format}")]
    UnsupportedFormat { format: String },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn missing_server_var(name: &'static str) -> Self {
        Self::MissingServerVar { name }
    }

    pub fn unsupported_format<S: ToString>(format: S) -> Self {
        Self::UnsupportedFormat { format: format.to_string() }
    }
}
