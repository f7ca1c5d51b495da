//! Per-request context.
//!
//! The transport creates a [`RequestContext`] for each call; the dispatcher
//! and handlers add entries to it, and the transport logs it with the final
//! outcome.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique request identifier (UUID v7, time-ordered).
///
/// # Example
///
/// ```
/// use scoring_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(RequestId::parse(&id.to_string()), Some(id));
/// assert_eq!(RequestId::parse("not-a-uuid"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a caller-supplied id, e.g. from an `X-Request-ID` header.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// State carried alongside one API call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Option<String>,
    entries: Map<String, Value>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request id.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            method: None,
            entries: Map::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the method name once the envelope has been read.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Records the method name.
    pub fn set_method(&mut self, method: impl Into<String>) {
        self.method = Some(method.into());
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Merges entries, replacing existing keys.
    pub fn extend(&mut self, entries: Map<String, Value>) {
        self.entries.extend(entries);
    }

    /// Returns a single entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns all entries.
    #[must_use]
    pub const fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
