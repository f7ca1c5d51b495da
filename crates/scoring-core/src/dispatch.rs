//! Request dispatch.
//!
//! Each call moves through a fixed sequence and exits early on the first
//! failure:
//!
//! ```text
//! Received -> EnvelopeValidated -> Authenticated -> ArgumentsValidated -> Dispatched -> Responded
//!    |400           |403               |404               |422               |500
//! ```
//!
//! Authentication runs before the method lookup and before any argument
//! is looked at, so an unauthenticated caller learns nothing about which
//! methods exist or what they expect.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::AuthGuard;
use crate::clock::Clock;
use crate::context::RequestContext;
use crate::error::{SchemaError, ScoringError};
use crate::handlers::MethodHandler;
use crate::registry::MethodRegistry;
use crate::request::{decode, FromArguments, MethodRequest};
use crate::response::Outcome;
use crate::schema::Schema;
use crate::store::Store;

/// Validates, authenticates and routes API calls.
///
/// Everything inside is immutable after construction, so a single
/// dispatcher can be shared across connections behind an `Arc`.
pub struct Dispatcher {
    envelope: Schema,
    registry: MethodRegistry,
    guard: AuthGuard,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    pub fn new(
        registry: MethodRegistry,
        guard: AuthGuard,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchemaError> {
        Ok(Self {
            envelope: MethodRequest::schema()?,
            registry,
            guard,
            store,
            clock,
        })
    }

    /// Returns the method registry.
    #[must_use]
    pub const fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Returns the auth guard.
    #[must_use]
    pub const fn guard(&self) -> &AuthGuard {
        &self.guard
    }

    /// Looks up the handler for `method`.
    pub fn route(&self, method: &str) -> Result<&Arc<dyn MethodHandler>, ScoringError> {
        self.registry
            .get(method)
            .ok_or_else(|| ScoringError::not_found(method))
    }

    /// Handles one decoded JSON body.
    ///
    /// Never fails: every error is turned into an [`Outcome`] with the
    /// matching status. Internal errors are logged here with their source
    /// and reach the caller only as the generic phrase.
    pub async fn dispatch(&self, body: &Value, ctx: &mut RequestContext) -> Outcome {
        match self.try_dispatch(body, ctx).await {
            Ok(payload) => Outcome::ok(payload),
            Err(error) => {
                log_failure(&error, ctx);
                Outcome::from_error(&error)
            }
        }
    }

    async fn try_dispatch(
        &self,
        body: &Value,
        ctx: &mut RequestContext,
    ) -> Result<Value, ScoringError> {
        let Value::Object(raw) = body else {
            return Err(ScoringError::bad_request("request body must be a JSON object"));
        };

        let request: MethodRequest =
            decode(&self.envelope, raw, self.clock.as_ref()).map_err(ScoringError::bad_envelope)?;
        ctx.set_method(request.method());

        if !self.guard.check(&request) {
            return Err(ScoringError::Forbidden);
        }

        let handler = self.route(request.method())?;

        let arguments = handler
            .schema()
            .bind(request.arguments(), self.clock.as_ref())
            .map_err(ScoringError::invalid_request)?;

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = handler.name(),
            admin = self.guard.is_admin(&request),
            "arguments validated"
        );

        handler.handle(arguments, ctx, self.store.as_ref()).await
    }
}

fn log_failure(error: &ScoringError, ctx: &RequestContext) {
    let request_id = ctx.request_id();
    let method = ctx.method().unwrap_or("-");
    match error {
        ScoringError::Internal { source, .. } => {
            tracing::error!(
                %request_id,
                method,
                error = %error,
                source = ?source,
                "request failed"
            );
        }
        ScoringError::Forbidden => {
            tracing::warn!(%request_id, method, "authentication failed");
        }
        _ => {
            tracing::info!(
                %request_id,
                method,
                code = error.status_code().as_u16(),
                error = %error,
                "request rejected"
            );
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("guard", &self.guard)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSettings;
    use crate::clock::FixedClock;
    use crate::error::StoreError;
    use crate::request::OnlineScoreRequest;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use http::StatusCode;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Store for CountingStore {
        async fn get_interests(
            &self,
            client_ids: &[u64],
        ) -> Result<BTreeMap<u64, Vec<String>>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(client_ids.iter().map(|id| (*id, vec!["books".into()])).collect())
        }

        async fn get_score(&self, _request: &OnlineScoreRequest) -> Result<f64, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(3.0)
        }
    }

    fn dispatcher(store: Arc<CountingStore>) -> Dispatcher {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2017, 7, 20)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        ));
        Dispatcher::new(
            MethodRegistry::standard().unwrap(),
            AuthGuard::new(AuthSettings::default(), clock.clone()),
            store,
            clock,
        )
        .unwrap()
    }

    fn token(d: &Dispatcher) -> String {
        d.guard().user_digest(Some("horns&hoofs"), Some("h&f"))
    }

    #[tokio::test]
    async fn test_non_object_body_is_bad_request() {
        let d = dispatcher(Arc::default());
        for body in [json!([1, 2]), json!("x"), json!(null), json!(5)] {
            let outcome = d.dispatch(&body, &mut RequestContext::new()).await;
            assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_bad_envelope_is_400() {
        let d = dispatcher(Arc::default());
        let body = json!({"login": "h&f", "token": "x", "arguments": {}});
        let outcome = d.dispatch(&body, &mut RequestContext::new()).await;
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
        assert_eq!(outcome.envelope().code(), 400);
    }

    #[tokio::test]
    async fn test_forbidden_before_not_found() {
        let d = dispatcher(Arc::default());
        let body = json!({
            "account": "horns&hoofs", "login": "h&f", "method": "nope",
            "token": "bad", "arguments": {}
        });
        let outcome = d.dispatch(&body, &mut RequestContext::new()).await;
        assert_eq!(outcome.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_method_is_404() {
        let d = dispatcher(Arc::default());
        let body = json!({
            "account": "horns&hoofs", "login": "h&f", "method": "nope",
            "token": token(&d), "arguments": {}
        });
        let mut ctx = RequestContext::new();
        let outcome = d.dispatch(&body, &mut ctx).await;
        assert_eq!(outcome.status(), StatusCode::NOT_FOUND);
        assert_eq!(ctx.method(), Some("nope"));
        assert!(d.route("nope").is_err());
        assert!(d.route("online_score").is_ok());
    }

    #[tokio::test]
    async fn test_invalid_arguments_skip_store() {
        let store = Arc::new(CountingStore::default());
        let d = dispatcher(store.clone());
        let body = json!({
            "account": "horns&hoofs", "login": "h&f", "method": "online_score",
            "token": token(&d), "arguments": {"phone": "79175002040"}
        });
        let outcome = d.dispatch(&body, &mut RequestContext::new()).await;
        assert_eq!(outcome.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_fills_context() {
        let store = Arc::new(CountingStore::default());
        let d = dispatcher(store.clone());
        let body = json!({
            "account": "horns&hoofs", "login": "h&f", "method": "online_score",
            "token": token(&d), "arguments": {"first_name": "a", "last_name": "b"}
        });
        let mut ctx = RequestContext::new();
        let outcome = d.dispatch(&body, &mut ctx).await;

        assert_eq!(outcome.status(), StatusCode::OK);
        assert_eq!(ctx.get("has"), Some(&json!(["first_name", "last_name"])));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
