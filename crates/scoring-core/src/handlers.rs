//! Method handlers.
//!
//! A handler owns the schema of its arguments. The dispatcher binds the raw
//! arguments against that schema first, so `handle` only ever sees values
//! that passed both validation stages.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::context::RequestContext;
use crate::error::{SchemaError, ScoringError};
use crate::registry::{CLIENTS_INTERESTS, ONLINE_SCORE};
use crate::request::{ClientsInterestsRequest, FromArguments, OnlineScoreRequest};
use crate::schema::{BoundFields, Schema};
use crate::store::Store;

/// A callable API method.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Method name used for routing.
    fn name(&self) -> &'static str;

    /// Schema the arguments must satisfy.
    fn schema(&self) -> &Schema;

    /// Produces the response payload.
    ///
    /// Handlers may add entries to `ctx`. Store failures should be returned,
    /// not swallowed; they become a generic 500.
    async fn handle(
        &self,
        arguments: BoundFields,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> Result<Value, ScoringError>;
}

/// `online_score`: returns `{"score": n}` and records which arguments were set.
#[derive(Debug, Clone)]
pub struct OnlineScoreHandler {
    schema: Schema,
}

impl OnlineScoreHandler {
    /// Creates the handler, building its schema.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: OnlineScoreRequest::schema()?,
        })
    }
}

#[async_trait]
impl MethodHandler for OnlineScoreHandler {
    fn name(&self) -> &'static str {
        ONLINE_SCORE
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn handle(
        &self,
        arguments: BoundFields,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> Result<Value, ScoringError> {
        let request = OnlineScoreRequest::from_bound(arguments);
        ctx.insert("has", request.has().to_vec());

        let score = store.get_score(&request).await?;
        if !score.is_finite() {
            return Err(ScoringError::internal(format!(
                "store returned a non-finite score: {score}"
            )));
        }
        Ok(json!({ "score": score }))
    }
}

/// `clients_interests`: returns `{"<id>": [...]}` and records `nclients`.
#[derive(Debug, Clone)]
pub struct ClientsInterestsHandler {
    schema: Schema,
}

impl ClientsInterestsHandler {
    /// Creates the handler, building its schema.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: ClientsInterestsRequest::schema()?,
        })
    }
}

#[async_trait]
impl MethodHandler for ClientsInterestsHandler {
    fn name(&self) -> &'static str {
        CLIENTS_INTERESTS
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn handle(
        &self,
        arguments: BoundFields,
        ctx: &mut RequestContext,
        store: &dyn Store,
    ) -> Result<Value, ScoringError> {
        let request = ClientsInterestsRequest::from_bound(arguments);
        ctx.extend(request.context());

        let interests = store.get_interests(request.client_ids()).await?;
        let payload: Map<String, Value> = interests
            .into_iter()
            .map(|(id, list)| (id.to_string(), Value::from(list)))
            .collect();
        Ok(Value::Object(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::error::StoreError;
    use std::collections::BTreeMap;

    struct EchoStore;

    #[async_trait]
    impl Store for EchoStore {
        async fn get_interests(
            &self,
            client_ids: &[u64],
        ) -> Result<BTreeMap<u64, Vec<String>>, StoreError> {
            Ok(client_ids
                .iter()
                .map(|id| (*id, vec![format!("topic-{id}")]))
                .collect())
        }

        async fn get_score(&self, request: &OnlineScoreRequest) -> Result<f64, StoreError> {
            Ok(request.has().iter().map(|_| 1.0).sum())
        }
    }

    struct NanStore;

    #[async_trait]
    impl Store for NanStore {
        async fn get_interests(
            &self,
            _client_ids: &[u64],
        ) -> Result<BTreeMap<u64, Vec<String>>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }

        async fn get_score(&self, _request: &OnlineScoreRequest) -> Result<f64, StoreError> {
            Ok(f64::NAN)
        }
    }

    fn bind(handler: &dyn MethodHandler, args: Value) -> BoundFields {
        handler
            .schema()
            .bind(args.as_object().unwrap(), &SystemClock)
            .unwrap()
    }

    #[tokio::test]
    async fn test_online_score_payload_and_context() {
        let handler = OnlineScoreHandler::new().unwrap();
        let args = bind(
            &handler,
            json!({"phone": "79175002040", "email": "a@b.c", "first_name": "a"}),
        );
        let mut ctx = RequestContext::new();

        let payload = handler.handle(args, &mut ctx, &EchoStore).await.unwrap();

        assert_eq!(payload, json!({"score": 3.0}));
        assert_eq!(ctx.get("has"), Some(&json!(["phone", "email", "first_name"])));
    }

    #[tokio::test]
    async fn test_clients_interests_payload_and_context() {
        let handler = ClientsInterestsHandler::new().unwrap();
        let args = bind(&handler, json!({"client_ids": [3, 1]}));
        let mut ctx = RequestContext::new();

        let payload = handler.handle(args, &mut ctx, &EchoStore).await.unwrap();

        assert_eq!(payload, json!({"1": ["topic-1"], "3": ["topic-3"]}));
        assert_eq!(ctx.get("nclients"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_store_failures_are_internal() {
        let handler = ClientsInterestsHandler::new().unwrap();
        let args = bind(&handler, json!({"client_ids": [1]}));
        let err = handler
            .handle(args, &mut RequestContext::new(), &NanStore)
            .await
            .unwrap_err();
        assert_eq!(err.client_message(), "Internal Server Error");

        let handler = OnlineScoreHandler::new().unwrap();
        let args = bind(&handler, json!({"first_name": "a", "last_name": "b"}));
        let err = handler
            .handle(args, &mut RequestContext::new(), &NanStore)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_names() {
        assert_eq!(OnlineScoreHandler::new().unwrap().name(), "online_score");
        assert_eq!(
            ClientsInterestsHandler::new().unwrap().name(),
            "clients_interests"
        );
    }
}
