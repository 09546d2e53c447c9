//! TokenProvider trait and AccessToken

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::error::AuthError;

/// A bearer token attached to every request sent by [`HttpTransport`].
///
/// [`HttpTransport`]: crate::transport::HttpTransport
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The bearer token.
    pub access_token: String,
    /// When the token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token without a known expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Creates a token that expires at the given instant.
    pub fn with_expiry(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Returns `true` if the token has expired.
    ///
    /// Returns `false` if expiration time is unknown.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }

    /// Returns the token as an `Authorization` header value.
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Supplies access tokens to the HTTP transport.
///
/// The transport calls `get_token` before each request with the service root
/// it is talking to. Implementations own caching and renewal.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Gets an access token for the given service root.
    async fn get_token(&self, service_root: &str) -> Result<AccessToken, AuthError>;
}

/// A token provider that always returns the same token.
///
/// # Example
///
/// ```
/// use odata_lib::auth::StaticTokenProvider;
///
/// let provider = StaticTokenProvider::new("my-access-token");
/// ```
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a provider for the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }

    /// Creates a provider from an existing [`AccessToken`].
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _service_root: &str) -> Result<AccessToken, AuthError> {
        if self.token.is_expired() {
            return Err(AuthError::TokenExpired {
                message: "static token has no renewal".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_bearer_header() {
        assert_eq!(AccessToken::new("abc").as_bearer(), "Bearer abc");
    }

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("abc");
        let token = provider.get_token("https://example.org/svc").await.unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_static_provider_rejects_expired_token() {
        let expired = AccessToken::with_expiry("abc", Utc::now() - Duration::minutes(5));
        let provider = StaticTokenProvider::from_token(expired);
        assert!(matches!(
            provider.get_token("https://example.org/svc").await,
            Err(AuthError::TokenExpired { .. })
        ));
    }
}
