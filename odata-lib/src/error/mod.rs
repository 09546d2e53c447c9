//! Error types

mod api;
mod auth;
mod odata;
mod validation;

pub use api::*;
pub use auth::*;
pub use odata::*;
pub use validation::*;
pub(crate) use validation::require_not_empty;

/// Top-level error returned by every fallible operation of the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The service answered with an error or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A bearer token could not be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A required argument was missing or empty.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A request body or response payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => api.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if the service answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
