//! Per-request options

use std::collections::BTreeMap;

/// Extra settings applied to a single request.
///
/// Headers set here override the client's defaults. `params` are appended to
/// the URL query string after the OData system query options.
///
/// # Example
///
/// ```
/// use odata_lib::api::RequestOptions;
///
/// let options = RequestOptions::new()
///     .header("Prefer", "odata.maxpagesize=50")
///     .param("sap-client", "100");
/// assert_eq!(options.params().get("sap-client").map(String::as_str), Some("100"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    headers: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    etag: Option<String>,
    return_representation: bool,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds or replaces a custom query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sends `If-Match: <etag>`.
    pub fn if_match(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Sends `Prefer: return=representation`.
    pub fn return_representation(mut self) -> Self {
        self.return_representation = true;
        self
    }

    /// Returns the extra headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns the custom query parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Returns the `If-Match` etag, if any.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Returns `true` if the server should echo the written entity.
    pub fn wants_representation(&self) -> bool {
        self.return_representation
    }

    /// Merges `other` into a copy of `self`; `other` wins on conflicts.
    pub fn merged(&self, other: &RequestOptions) -> RequestOptions {
        let mut merged = self.clone();
        merged.headers.extend(other.headers.clone());
        merged.params.extend(other.params.clone());
        if other.etag.is_some() {
            merged.etag = other.etag.clone();
        }
        merged.return_representation |= other.return_representation;
        merged
    }
}
