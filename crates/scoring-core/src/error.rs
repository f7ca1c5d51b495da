//! Error types for the scoring API.
//!
//! Two families of failure reach the dispatcher boundary:
//!
//! | Kind | Caused by | Status |
//! |---|---|---|
//! | [`ValidationError`] in the envelope | caller | 400 |
//! | authentication failure | caller | 403 |
//! | unknown method | caller | 404 |
//! | [`ValidationError`] in the arguments | caller | 422 |
//! | handler or [`StoreError`] failure | server | 500 |
//!
//! [`ScoringError`] carries all of them and knows its status code and the
//! message that is safe to show to a client.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`ScoringError`].
pub type ScoringResult<T> = Result<T, ScoringError>;

/// A caller-caused validation failure with a single human-readable cause.
///
/// Validation is fail-fast, so at most one of these is produced per request.
///
/// # Example
///
/// ```
/// use scoring_core::ValidationError;
///
/// let err = ValidationError::new("field is required").with_field("login");
/// assert_eq!(err.to_string(), "login: field is required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: Option<String>,
    reason: String,
}

impl ValidationError {
    /// Creates an error that is not tied to a single field.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            field: None,
            reason: reason.into(),
        }
    }

    /// Creates an error for the named field.
    #[must_use]
    pub fn for_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            reason: reason.into(),
        }
    }

    /// Attaches a field name, keeping an existing one.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        if self.field.is_none() {
            self.field = Some(field.into());
        }
        self
    }

    /// Returns the field name, if the error concerns a single field.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the reason without the field prefix.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A fault in a schema definition, detected when the schema is built at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The same field name was declared twice.
    #[error("duplicate field '{field}' in schema '{schema}'")]
    DuplicateField {
        /// Schema being built.
        schema: String,
        /// Offending field name.
        field: String,
    },

    /// The schema declares no fields.
    #[error("schema '{0}' has no fields")]
    Empty(String),
}

/// Failure reported by a [`Store`](crate::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error produced while handling a single API call.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Malformed body or envelope.
    #[error("bad request: {message}")]
    BadRequest {
        /// Message shown to the caller.
        message: String,
    },

    /// Token did not match the expected digest.
    #[error("forbidden")]
    Forbidden,

    /// No handler is registered under the requested method name.
    #[error("unknown method '{method}'")]
    NotFound {
        /// The method the caller asked for.
        method: String,
    },

    /// Arguments failed the method's schema.
    #[error("invalid request: {0}")]
    InvalidRequest(ValidationError),

    /// Server-side failure. The message and source are logged, never returned.
    #[error("internal error: {message}")]
    Internal {
        /// Description for logs.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ScoringError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Wraps an envelope validation failure.
    #[must_use]
    pub fn bad_envelope(error: ValidationError) -> Self {
        Self::BadRequest {
            message: error.to_string(),
        }
    }

    /// Wraps an argument validation failure.
    #[must_use]
    pub fn invalid_request(error: ValidationError) -> Self {
        Self::InvalidRequest(error)
    }

    /// Creates a not found error for a method name.
    #[must_use]
    pub fn not_found(method: impl Into<String>) -> Self {
        Self::NotFound {
            method: method.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message that may be shown to the caller.
    ///
    /// Internal errors always collapse to the generic phrase.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::BadRequest { message } => message.clone(),
            Self::InvalidRequest(error) => error.to_string(),
            Self::Forbidden | Self::NotFound { .. } | Self::Internal { .. } => {
                status_phrase(self.status_code()).to_string()
            }
        }
    }
}

impl From<StoreError> for ScoringError {
    fn from(err: StoreError) -> Self {
        Self::internal_with_source("store call failed", err)
    }
}

/// Canonical phrase for the status codes the API emits.
#[must_use]
pub fn status_phrase(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad Request",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::UNPROCESSABLE_ENTITY => "Invalid Request",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "Unknown Error",
    }
}
