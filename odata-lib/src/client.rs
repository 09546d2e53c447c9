//! Main ODataClient

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::header::HeaderName;
use reqwest::header::HeaderValue;

use crate::api::BatchResource;
use crate::api::Collection;
use crate::api::EntityService;
use crate::api::query::QueryBuilder;
use crate::auth::StaticTokenProvider;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::error::Error;
use crate::error::require_not_empty;
use crate::model::ODataEntity;
use crate::transport::HttpTransport;
use crate::transport::Transport;

/// The main client for talking to an OData v4 service.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across threads safely.
///
/// # Example
///
/// ```ignore
/// use odata_lib::{ODataClient, transport::HttpTransport};
///
/// let client = ODataClient::builder()
///     .service_root("https://services.odata.org/V4/TripPinServiceRW")
///     .transport(HttpTransport::new()?)
///     .build()?;
///
/// let people = client.service::<Person>().all().await?;
/// ```
#[derive(Clone)]
pub struct ODataClient {
    inner: Arc<ODataClientInner>,
}

struct ODataClientInner {
    service_root: String,
    transport: Arc<dyn Transport>,
    default_headers: HeaderMap,
}

impl ODataClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> ODataClientBuilder<Missing, Missing> {
        ODataClientBuilder::new()
    }

    /// Builds a client with the default HTTP transport from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let mut transport = HttpTransport::builder();
        if let Some(timeout) = config.timeout() {
            transport = transport.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout() {
            transport = transport.connect_timeout(timeout);
        }
        if let Some(token) = &config.access_token {
            transport = transport.token_provider(StaticTokenProvider::new(token.clone()));
        }

        let mut builder = Self::builder()
            .service_root(config.service_root.clone())
            .transport(transport.build()?);
        for (name, value) in &config.headers {
            builder = builder.default_header(name.clone(), value.clone());
        }
        builder.build()
    }

    /// Returns the service root, without a trailing slash.
    pub fn service_root(&self) -> &str {
        &self.inner.service_root
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn default_headers(&self) -> &HeaderMap {
        &self.inner.default_headers
    }

    /// Resolves a relative resource path against the service root.
    ///
    /// Absolute URLs (such as `@odata.nextLink` values) are returned as-is.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return self.inner.service_root.clone();
        }
        format!("{}/{}", self.inner.service_root, path)
    }

    /// Returns the absolute URL of `query`.
    pub fn endpoint_url(&self, query: &QueryBuilder) -> String {
        self.resolve_url(&query.to_string())
    }

    /// Starts a query on the entity set `set`.
    pub fn query(&self, set: impl Into<String>) -> Result<QueryBuilder, Error> {
        QueryBuilder::new(set)
    }

    /// Returns the CRUD shortcuts for entity type `T`.
    pub fn service<T: ODataEntity>(&self) -> EntityService<T> {
        EntityService::new(self.clone())
    }

    /// Returns a paginated view over `query`.
    pub fn collection<T>(&self, query: QueryBuilder) -> Collection<T> {
        Collection::new(self.clone(), query)
    }

    /// Starts an empty batch.
    pub fn batch(&self) -> BatchResource {
        BatchResource::new()
    }
}

impl std::fmt::Debug for ODataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ODataClient")
            .field("service_root", &self.inner.service_root)
            .field("default_headers", &self.inner.default_headers)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing an [`ODataClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `service_root` - The OData service root URL
/// - `transport` - A [`Transport`] implementation
///
/// # Example
///
/// ```ignore
/// let client = ODataClient::builder()
///     .service_root("https://services.odata.org/V4/TripPinServiceRW")
///     .transport(HttpTransport::new()?)
///     .default_header("Accept-Language", "en")
///     .build()?;
/// ```
pub struct ODataClientBuilder<Root, Tr> {
    service_root: Root,
    transport: Tr,
    default_headers: Vec<(String, String)>,
}

impl ODataClientBuilder<Missing, Missing> {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            service_root: Missing,
            transport: Missing,
            default_headers: Vec::new(),
        }
    }
}

impl Default for ODataClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ODataClientBuilder<Missing, T> {
    /// Sets the service root URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .service_root("https://services.odata.org/V4/TripPinServiceRW")
    /// ```
    pub fn service_root(self, url: impl Into<String>) -> ODataClientBuilder<Set<String>, T> {
        ODataClientBuilder {
            service_root: Set(url.into()),
            transport: self.transport,
            default_headers: self.default_headers,
        }
    }
}

impl<R> ODataClientBuilder<R, Missing> {
    /// Sets the transport used to send requests.
    pub fn transport<T: Transport + 'static>(
        self,
        transport: T,
    ) -> ODataClientBuilder<R, Set<Arc<dyn Transport>>> {
        ODataClientBuilder {
            service_root: self.service_root,
            transport: Set(Arc::new(transport) as Arc<dyn Transport>),
            default_headers: self.default_headers,
        }
    }
}

impl<R, T> ODataClientBuilder<R, T> {
    /// Adds a header sent with every request.
    ///
    /// Per-request headers take precedence.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }
}

impl ODataClientBuilder<Set<String>, Set<Arc<dyn Transport>>> {
    /// Builds the [`ODataClient`].
    ///
    /// Fails if the service root is empty or a default header is not a valid
    /// HTTP header.
    pub fn build(self) -> Result<ODataClient, Error> {
        let service_root = self.service_root.0.trim().trim_end_matches('/').to_string();
        require_not_empty(&service_root, "service_root")?;
        let is_http = ::url::Url::parse(&service_root)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        if !is_http {
            return Err(ApiError::InvalidUrl(service_root).into());
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let (name, value) = parse_header(name, value)?;
            default_headers.insert(name, value);
        }

        Ok(ODataClient {
            inner: Arc::new(ODataClientInner {
                service_root,
                transport: self.transport.0,
                default_headers,
            }),
        })
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ApiError> {
    let invalid = || ApiError::InvalidHeader {
        name: name.to_string(),
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpRequest;
    use crate::transport::HttpResponse;

    struct NoopTransport;

    #[async_trait::async_trait]
    impl Transport for NoopTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, Error> {
            Ok(HttpResponse::new(reqwest::StatusCode::NO_CONTENT, ""))
        }
    }

    fn client() -> ODataClient {
        ODataClient::builder()
            .service_root("https://example.org/svc/")
            .transport(NoopTransport)
            .build()
            .unwrap()
    }

    #[test]
    fn test_service_root_is_normalized() {
        assert_eq!(client().service_root(), "https://example.org/svc");
    }

    #[test]
    fn test_resolve_url() {
        let client = client();
        assert_eq!(client.resolve_url("People"), "https://example.org/svc/People");
        assert_eq!(client.resolve_url("/$batch"), "https://example.org/svc/$batch");
        assert_eq!(client.resolve_url(""), "https://example.org/svc");
        assert_eq!(
            client.resolve_url("https://other.org/svc/People?$skip=8"),
            "https://other.org/svc/People?$skip=8"
        );
    }

    #[test]
    fn test_endpoint_url() {
        let query = QueryBuilder::new("People").unwrap().key("russellwhyte").top(1);
        assert_eq!(
            client().endpoint_url(&query),
            "https://example.org/svc/People('russellwhyte')?$top=1"
        );
    }

    #[test]
    fn test_build_rejects_bad_input() {
        let empty = ODataClient::builder()
            .service_root("  ")
            .transport(NoopTransport)
            .build();
        assert!(matches!(empty, Err(Error::Validation(_))));

        for root in ["People", "ftp://example.org/svc"] {
            let relative = ODataClient::builder()
                .service_root(root)
                .transport(NoopTransport)
                .build();
            assert!(matches!(relative, Err(Error::Api(ApiError::InvalidUrl(_)))));
        }

        let bad_header = ODataClient::builder()
            .service_root("https://example.org/svc")
            .transport(NoopTransport)
            .default_header("Bad Header", "x")
            .build();
        assert!(matches!(
            bad_header,
            Err(Error::Api(ApiError::InvalidHeader { .. }))
        ));
    }
}
