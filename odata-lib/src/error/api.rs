//! API error types

use super::ODataErrorDetail;

/// Errors that can occur while talking to an OData service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP error response from the service.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message (the OData error message, or the raw body).
        message: String,
        /// OData error code, if the body carried one.
        code: Option<String>,
        /// Structured OData error, if the body could be decoded.
        inner: Option<Box<ODataErrorDetail>>,
    },

    /// Network error during the call.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service root is not an absolute http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value could not be encoded.
    #[error("Invalid header '{name}'")]
    InvalidHeader {
        /// The offending header name.
        name: String,
    },

    /// Failed to parse the response.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

impl ApiError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            code: None,
            inner: None,
        }
    }

    /// Builds an HTTP error from a failed response body.
    ///
    /// When the body is an OData error document its message and code are
    /// used, otherwise the body is kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match ODataErrorDetail::from_body(body) {
            Some(detail) => Self::Http {
                status,
                message: detail.message.clone(),
                code: Some(detail.code.clone()),
                inner: Some(Box::new(detail)),
            },
            None if body.trim().is_empty() => Self::http(status, format!("HTTP {} error", status)),
            None => Self::http(status, body),
        }
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the OData error code if available.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns the OData error detail if available.
    pub fn odata_detail(&self) -> Option<&ODataErrorDetail> {
        match self {
            Self::Http { inner, .. } => inner.as_deref(),
            _ => None,
        }
    }
}
