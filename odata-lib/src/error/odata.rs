//! OData error documents

use std::collections::HashMap;

use serde::Deserialize;

/// Error information carried in an OData error response.
///
/// OData v4 services answer failures with
/// `{"error": {"code": ..., "message": ..., "details": [...], "innererror": {...}}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ODataErrorDetail {
    /// The service-defined error code.
    #[serde(default)]
    pub code: String,
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
    /// The target of the error (usually a property name).
    #[serde(default)]
    pub target: Option<String>,
    /// Additional errors reported alongside the main one.
    #[serde(default)]
    pub details: Vec<ODataErrorDetail>,
    /// Service-specific debugging information.
    #[serde(default, rename = "innererror")]
    pub inner_error: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Deserialize)]
struct ErrorDocument {
    error: ODataErrorDetail,
}

impl ODataErrorDetail {
    /// Creates a new error detail with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: None,
            details: Vec::new(),
            inner_error: None,
        }
    }

    /// Decodes an OData error document, returning `None` for anything else.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str::<ErrorDocument>(body)
            .ok()
            .map(|doc| doc.error)
    }

    /// Checks if this error or any of its details has the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.code == code || self.details.iter().any(|d| d.has_code(code))
    }
}

impl std::fmt::Display for ODataErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
