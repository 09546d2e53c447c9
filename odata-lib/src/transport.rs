//! HTTP transport abstraction.
//!
//! The client never talks to the network directly. Every request goes through
//! a [`Transport`], which makes it possible to swap the default
//! [`HttpTransport`] for an in-memory implementation in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;

use crate::auth::TokenProvider;
use crate::error::ApiError;
use crate::error::Error;

/// A fully resolved HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header, ignoring values that are not valid header text.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the body is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::Api(ApiError::parse_with_body(e.to_string(), self.body.clone())))
    }
}

/// Sends HTTP requests on behalf of the client.
///
/// Implementations return every response, including non-2xx ones; mapping
/// statuses to errors is the client's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and buffers the response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        (**self).send(request).await
    }
}

/// [`Transport`] backed by `reqwest`.
///
/// When a [`TokenProvider`] is configured, each request carries a bearer
/// token obtained for the request URL's origin.
pub struct HttpTransport {
    http_client: Client,
    token_provider: Option<Arc<dyn TokenProvider>>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client and no
    /// authentication.
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Creates a new builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self
            .http_client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(provider) = &self.token_provider {
            let token = provider.get_token(&origin(&request.url)).await?;
            builder = builder.header(AUTHORIZATION, token.as_bearer());
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(ApiError::from)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Builder for [`HttpTransport`].
#[derive(Default)]
pub struct HttpTransportBuilder {
    token_provider: Option<Arc<dyn TokenProvider>>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl HttpTransportBuilder {
    /// Sets the token provider for bearer authentication.
    pub fn token_provider<T: TokenProvider + 'static>(mut self, provider: T) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// Ignored when a custom HTTP client is supplied.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the transport.
    pub fn build(self) -> Result<HttpTransport, Error> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(ApiError::from)?
            }
        };

        Ok(HttpTransport {
            http_client,
            token_provider: self.token_provider,
            timeout: self.timeout,
        })
    }
}

/// Returns `scheme://host[:port]` for `url`, or `url` itself when it does
/// not parse.
fn origin(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.origin().ascii_serialization(),
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        assert_eq!(
            origin("https://services.odata.org/V4/TripPinService/People"),
            "https://services.odata.org"
        );
        assert_eq!(origin("http://localhost:8080/svc/$batch"), "http://localhost:8080");
        assert_eq!(origin("not a url"), "not a url");
    }

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(StatusCode::OK, r#"{"value": 3}"#)
            .with_header("ETag", "W/\"1\"");
        assert!(response.is_success());
        assert_eq!(response.header("etag"), Some("W/\"1\""));

        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["value"], 3);

        let empty = HttpResponse::new(StatusCode::NO_CONTENT, "");
        assert!(empty.is_empty());
        assert!(empty.json::<serde_json::Value>().is_err());
    }
}
