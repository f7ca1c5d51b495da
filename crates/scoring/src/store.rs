//! In-process store used when no external backend is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scoring_core::{OnlineScoreRequest, Store, StoreError};

/// Interests a client can be assigned.
pub const INTERESTS: [&str; 11] = [
    "cars", "pets", "travel", "hi-tech", "sport", "music", "books", "tv", "cinema", "geek", "otus",
];

/// Deterministic store: same input, same answer.
///
/// Each client gets two distinct interests derived from its id. Scores add
/// a fixed weight for each populated field group.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    /// Creates the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Interests for one client.
    #[must_use]
    pub fn interests_for(client_id: u64) -> Vec<String> {
        let n = INTERESTS.len() as u64;
        let first = client_id % n;
        let second = (first + 1 + (client_id / n) % (n - 1)) % n;
        [first, second]
            .iter()
            .filter_map(|&i| usize::try_from(i).ok())
            .map(|i| INTERESTS[i].to_string())
            .collect()
    }

    /// Score for a validated request.
    #[must_use]
    pub fn score(request: &OnlineScoreRequest) -> f64 {
        let mut score = 0.0;
        if request.phone().is_some() {
            score += 1.5;
        }
        if request.email().is_some() {
            score += 1.5;
        }
        if request.birthday().is_some() && request.gender().is_some() {
            score += 1.5;
        }
        if request.first_name().is_some() && request.last_name().is_some() {
            score += 0.5;
        }
        score
    }
}

#[async_trait]
impl Store for LocalStore {
    async fn get_interests(
        &self,
        client_ids: &[u64],
    ) -> Result<BTreeMap<u64, Vec<String>>, StoreError> {
        Ok(client_ids
            .iter()
            .map(|&id| (id, Self::interests_for(id)))
            .collect())
    }

    async fn get_score(&self, request: &OnlineScoreRequest) -> Result<f64, StoreError> {
        Ok(Self::score(request))
    }
}
