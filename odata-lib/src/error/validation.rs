//! Argument validation errors

/// A required argument was missing or empty.
///
/// Raised synchronously, before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid argument '{argument}': {message}")]
pub struct ValidationError {
    /// The argument that failed validation.
    pub argument: String,
    /// What was wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// The argument was required but not provided.
    pub fn missing(argument: impl Into<String>) -> Self {
        Self::new(argument, "is required")
    }

    /// The argument was provided but empty.
    pub fn empty(argument: impl Into<String>) -> Self {
        Self::new(argument, "must not be empty")
    }
}

/// Fails with [`ValidationError::empty`] when `value` is empty or whitespace.
pub(crate) fn require_not_empty(value: &str, argument: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty(argument));
    }
    Ok(())
}
