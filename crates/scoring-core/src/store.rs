//! Backend collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::request::OnlineScoreRequest;

/// Source of business answers once a request has been validated.
///
/// Implementations own their concurrency and timeout behaviour. Any error
/// is reported to the caller as a generic internal error.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the interests of each requested client.
    async fn get_interests(&self, client_ids: &[u64])
        -> Result<BTreeMap<u64, Vec<String>>, StoreError>;

    /// Computes the online score for the given arguments.
    async fn get_score(&self, request: &OnlineScoreRequest) -> Result<f64, StoreError>;
}
