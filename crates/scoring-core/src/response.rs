//! Wire response envelope.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{status_phrase, ScoringError};

/// Body of every API response.
///
/// Success: `{"response": <payload>, "code": 200}`.
/// Failure: `{"error": "<message>", "code": <status>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// Handler payload.
    Success {
        /// Payload produced by the handler.
        response: Value,
        /// Always 200.
        code: u16,
    },
    /// Error message.
    Failure {
        /// Caller-facing message or the status phrase.
        error: String,
        /// HTTP status code.
        code: u16,
    },
}

impl ResponseEnvelope {
    /// Returns the `code` field.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Success { code, .. } | Self::Failure { code, .. } => *code,
        }
    }
}

/// Final result of one dispatch: status plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    status: StatusCode,
    envelope: ResponseEnvelope,
}

impl Outcome {
    /// A 200 response carrying `payload`.
    #[must_use]
    pub fn ok(payload: Value) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: ResponseEnvelope::Success {
                response: payload,
                code: StatusCode::OK.as_u16(),
            },
        }
    }

    /// A failure response for `error`.
    #[must_use]
    pub fn from_error(error: &ScoringError) -> Self {
        Self::failure(error.status_code(), error.client_message())
    }

    /// A failure response with the canonical phrase for `status`.
    #[must_use]
    pub fn status_only(status: StatusCode) -> Self {
        Self::failure(status, status_phrase(status))
    }

    /// A generic 500.
    #[must_use]
    pub fn internal() -> Self {
        Self::status_only(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            envelope: ResponseEnvelope::Failure {
                error: message.into(),
                code: status.as_u16(),
            },
        }
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns `true` for a 200 outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Response body.
    #[must_use]
    pub const fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }

    /// Serialises the body.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.envelope)
    }
}

impl From<ScoringError> for Outcome {
    fn from(error: ScoringError) -> Self {
        Self::from_error(&error)
    }
}
