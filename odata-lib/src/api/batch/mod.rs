//! Batch/changeset operations
//!
//! A [`BatchResource`] collects requests and sends them as one
//! `multipart/mixed` `POST $batch`. Consecutive write requests are grouped
//! into a changeset, which the service applies atomically.
//!
//! # Example
//!
//! ```ignore
//! let mut batch = client.batch();
//! batch
//!     .get(QueryBuilder::new("People")?.top(2))
//!     .post(QueryBuilder::new("People")?, &new_person)?
//!     .delete(QueryBuilder::new("People")?.key("vincentcalabrese"));
//!
//! let response = batch.execute(&client, &RequestOptions::new()).await?;
//! assert!(response.all_succeeded());
//! ```

pub mod multipart;
pub mod response;

pub use response::BatchItem;
pub use response::BatchPart;
pub use response::BatchResponse;
pub use response::extract_boundary;

use reqwest::Method;
use serde::Serialize;

use super::RequestOptions;
use super::query::QueryBuilder;
use crate::ODataClient;
use crate::error::ApiError;
use crate::error::Error;

// =============================================================================
// Batch Request
// =============================================================================

/// One request queued in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub(crate) method: Method,
    pub(crate) query: QueryBuilder,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) headers: Vec<(String, String)>,
}

impl BatchRequest {
    /// Creates a request without body or headers.
    pub fn new(method: Method, query: QueryBuilder) -> Self {
        Self {
            method,
            query,
            body: None,
            headers: Vec::new(),
        }
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header to the request part.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the target query.
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// Returns the JSON body, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Returns the part headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

// =============================================================================
// Batch Resource
// =============================================================================

/// An ordered list of requests sent in a single HTTP call.
///
/// The batch boundary (`batch_<uuid>`) is generated at construction and can
/// be overridden with [`set_batch_boundary`](Self::set_batch_boundary).
/// [`execute`](Self::execute) consumes the resource.
#[derive(Debug, Clone)]
pub struct BatchResource {
    requests: Vec<BatchRequest>,
    boundary: String,
}

impl Default for BatchResource {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchResource {
    /// Creates a new empty batch.
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            boundary: multipart::generate_boundary("batch"),
        }
    }

    /// Appends a request.
    pub fn add(&mut self, request: BatchRequest) -> &mut Self {
        self.requests.push(request);
        self
    }

    /// Appends a GET.
    pub fn get(&mut self, query: QueryBuilder) -> &mut Self {
        self.add(BatchRequest::new(Method::GET, query))
    }

    /// Appends a POST with `body` serialized as JSON.
    pub fn post<B: Serialize + ?Sized>(&mut self, query: QueryBuilder, body: &B) -> Result<&mut Self, Error> {
        self.add_with_body(Method::POST, query, body)
    }

    /// Appends a PUT with `body` serialized as JSON.
    pub fn put<B: Serialize + ?Sized>(&mut self, query: QueryBuilder, body: &B) -> Result<&mut Self, Error> {
        self.add_with_body(Method::PUT, query, body)
    }

    /// Appends a PATCH with `body` serialized as JSON.
    pub fn patch<B: Serialize + ?Sized>(&mut self, query: QueryBuilder, body: &B) -> Result<&mut Self, Error> {
        self.add_with_body(Method::PATCH, query, body)
    }

    /// Appends a DELETE.
    pub fn delete(&mut self, query: QueryBuilder) -> &mut Self {
        self.add(BatchRequest::new(Method::DELETE, query))
    }

    fn add_with_body<B: Serialize + ?Sized>(
        &mut self,
        method: Method,
        query: QueryBuilder,
        body: &B,
    ) -> Result<&mut Self, Error> {
        let body = serde_json::to_value(body)?;
        Ok(self.add(BatchRequest::new(method, query).with_body(body)))
    }

    /// Overrides the batch boundary.
    pub fn set_batch_boundary(&mut self, boundary: impl Into<String>) {
        self.boundary = boundary.into();
    }

    /// Returns the batch boundary.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the queued requests.
    pub fn requests(&self) -> &[BatchRequest] {
        &self.requests
    }

    /// Returns the number of queued requests.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Serializes the requests as a `multipart/mixed` body.
    ///
    /// Changeset boundaries are fresh on every call. An empty batch yields an
    /// empty string.
    pub fn body(&self) -> String {
        multipart::build_batch_body(&self.requests, &self.boundary)
    }

    /// Sends the batch as `POST $batch` and parses the multipart response.
    ///
    /// Headers in `options` override the batch defaults. An empty batch is
    /// sent with an empty body.
    pub async fn execute(self, client: &ODataClient, options: &RequestOptions) -> Result<BatchResponse, Error> {
        let body = self.body();
        log::trace!("batch {} body:\n{}", self.boundary, body);

        let defaults = RequestOptions::new()
            .header("OData-Version", "4.0")
            .header("Content-Type", format!("multipart/mixed;boundary={}", self.boundary))
            .header("Accept", "multipart/mixed");
        let options = defaults.merged(options);

        let response = client.request(Method::POST, "$batch", Some(body), &options).await?;

        let boundary = response
            .header("content-type")
            .and_then(extract_boundary)
            .ok_or_else(|| {
                ApiError::parse_with_body("batch response has no multipart boundary", response.body.clone())
            })?;

        BatchResponse::parse(&response.body, &boundary)
    }
}
