//! HTTP server.
//!
//! Routes:
//!
//! | Route | Response |
//! |-------|----------|
//! | `POST /method` | Dispatched API call |
//! | `GET /health` | `{"status":"ok"}` |
//! | `GET /metrics` | Prometheus text, 404 when metrics are off |
//! | anything else | `{"error":"Not Found","code":404}` |
//!
//! Every connection runs on its own task. Each API call is dispatched on a
//! further task so a panicking handler or a stuck store turns into a 500
//! instead of a dropped connection.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};

use scoring_core::{Dispatcher, Outcome, RequestContext, RequestId};
use scoring_telemetry::metrics::{record_auth_failure, record_request, record_validation_failure};
use scoring_telemetry::{render_metrics, InFlightGuard};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::request_id::{request_id_from_headers, set_request_id};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response type produced by the server.
pub type HttpResponse = Response<Full<Bytes>>;

/// Path of the API endpoint.
pub const METHOD_PATH: &str = "/method";

const JSON: HeaderValue = HeaderValue::from_static("application/json");
const PROMETHEUS_TEXT: HeaderValue = HeaderValue::from_static("text/plain; version=0.0.4");
const FALLBACK_500: &[u8] = br#"{"error":"Internal Server Error","code":500}"#;

/// The scoring API server.
///
/// ```rust,ignore
/// let server = Server::new(ServerConfig::default(), Arc::new(dispatcher));
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Creates a server around a shared dispatcher.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|_| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        self.run_with_listener(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "scoring server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.serve_connection(stream, shutdown).await {
                                tracing::debug!(%remote, error = %e, "connection closed with error");
                            }
                            drop(guard);
                        });
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        let grace = server.config.shutdown_timeout();
        tracing::info!(
            open = tracker.active_connections(),
            grace_secs = grace.as_secs(),
            "shutting down"
        );

        if tokio::time::timeout(grace, tracker.wait_idle()).await.is_err() {
            tracing::warn!(
                open = tracker.active_connections(),
                "grace period elapsed with connections still open"
            );
        }

        tracing::info!("scoring server stopped");
        Ok(())
    }

    async fn serve_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.respond(req).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Produces the response for one request.
    pub async fn respond<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let request_id = request_id_from_headers(req.headers());
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let mut response = match (&method, path.as_str()) {
            (&Method::POST, METHOD_PATH) => self.handle_method(req, request_id).await,
            (&Method::GET, "/health") => {
                json_response(StatusCode::OK, br#"{"status":"ok"}"#.to_vec())
            }
            (&Method::GET, "/metrics") if self.config.metrics_enabled() => metrics_response(),
            _ => {
                tracing::debug!(%request_id, %method, path = %path, "no route");
                outcome_response(&Outcome::status_only(StatusCode::NOT_FOUND))
            }
        };

        set_request_id(response.headers_mut(), request_id);
        response
    }

    async fn handle_method<B>(&self, req: Request<B>, request_id: RequestId) -> HttpResponse
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();
        let deadline = started + self.config.request_timeout();

        let (outcome, ctx) = match self.read_json(req, deadline).await {
            Some(body) => self.dispatch(body, request_id, deadline).await,
            None => (
                Outcome::status_only(StatusCode::BAD_REQUEST),
                RequestContext::with_request_id(request_id),
            ),
        };

        let method = ctx
            .method()
            .filter(|m| self.dispatcher.registry().contains(m))
            .unwrap_or("-");
        let code = outcome.status().as_u16();

        record_request(method, code, started.elapsed());
        match outcome.status() {
            StatusCode::FORBIDDEN => record_auth_failure(),
            StatusCode::BAD_REQUEST => record_validation_failure("envelope"),
            StatusCode::UNPROCESSABLE_ENTITY => record_validation_failure("arguments"),
            _ => {}
        }

        tracing::info!(
            %request_id,
            method = ctx.method().unwrap_or("-"),
            code,
            context = %serde_json::Value::Object(ctx.entries().clone()),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        outcome_response(&outcome)
    }

    /// Reads and parses the body. `None` means 400.
    async fn read_json<B>(&self, req: Request<B>, deadline: Instant) -> Option<Value>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limited = Limited::new(req.into_body(), self.config.max_body_bytes());
        let collected = tokio::time::timeout_at(deadline.into(), limited.collect()).await;

        let bytes = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) => {
                tracing::info!(error = %e, "unreadable request body");
                return None;
            }
            Err(_) => {
                tracing::info!("timed out reading request body");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::info!(error = %e, "request body is not JSON");
                None
            }
        }
    }

    /// Runs the dispatcher on its own task, bounded by `deadline`.
    async fn dispatch(
        &self,
        body: Value,
        request_id: RequestId,
        deadline: Instant,
    ) -> (Outcome, RequestContext) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut task = tokio::spawn(async move {
            let mut ctx = RequestContext::with_request_id(request_id);
            let outcome = dispatcher.dispatch(&body, &mut ctx).await;
            (outcome, ctx)
        });

        match tokio::time::timeout_at(deadline.into(), &mut task).await {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                tracing::error!(%request_id, error = %e, "dispatch task failed");
                (Outcome::internal(), RequestContext::with_request_id(request_id))
            }
            Err(_) => {
                task.abort();
                tracing::error!(%request_id, "dispatch timed out");
                (Outcome::internal(), RequestContext::with_request_id(request_id))
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("methods", &self.dispatcher.registry().names())
            .finish()
    }
}

fn json_response(status: StatusCode, body: Vec<u8>) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, JSON);
    response
}

fn outcome_response(outcome: &Outcome) -> HttpResponse {
    match outcome.to_json() {
        Ok(body) => json_response(outcome.status(), body),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialise response");
            json_response(StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_500.to_vec())
        }
    }
}

fn metrics_response() -> HttpResponse {
    let Some(text) = render_metrics() else {
        return outcome_response(&Outcome::status_only(StatusCode::NOT_FOUND));
    };
    let mut response = Response::new(Full::new(Bytes::from(text)));
    response.headers_mut().insert(CONTENT_TYPE, PROMETHEUS_TEXT);
    response
}
