//! Drives a running server over TCP with hyper's client connection.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use http::{Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use scoring_core::{
    AuthGuard, AuthSettings, Clock, Dispatcher, FixedClock, MethodRegistry, OnlineScoreRequest,
    Store, StoreError,
};
use scoring_server::{Server, ServerConfig, ShutdownSignal, REQUEST_ID_HEADER};
use serde_json::{json, Value};
use sha2::{Digest, Sha512};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct CatalogueStore;

#[async_trait]
impl Store for CatalogueStore {
    async fn get_interests(
        &self,
        client_ids: &[u64],
    ) -> Result<BTreeMap<u64, Vec<String>>, StoreError> {
        Ok(client_ids
            .iter()
            .map(|id| (*id, vec!["cars".to_string(), format!("tag-{id}")]))
            .collect())
    }

    async fn get_score(&self, _request: &OnlineScoreRequest) -> Result<f64, StoreError> {
        Ok(3.0)
    }
}

struct Running {
    addr: SocketAddr,
    shutdown: ShutdownSignal,
    handle: JoinHandle<Result<(), scoring_server::ServerError>>,
}

impl Running {
    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server stops")
            .expect("server task")
            .expect("server result");
    }
}

async fn start() -> Running {
    let now = NaiveDate::from_ymd_opt(2017, 7, 20)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
    let dispatcher = Dispatcher::new(
        MethodRegistry::standard().unwrap(),
        AuthGuard::new(AuthSettings::default(), Arc::clone(&clock)),
        Arc::new(CatalogueStore),
        clock,
    )
    .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let config = ServerConfig::builder()
        .shutdown_timeout(Duration::from_millis(200))
        .build();
    let server = Server::new(config, Arc::new(dispatcher));
    let handle = tokio::spawn(server.run_with_listener(listener, shutdown.clone()));

    Running {
        addr,
        shutdown,
        handle,
    }
}

async fn send(addr: SocketAddr, req: Request<Full<Bytes>>) -> (StatusCode, http::HeaderMap, Bytes) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let response = sender.send_request(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

fn post_json(addr: SocketAddr, body: &Value) -> Request<Full<Bytes>> {
    Request::post("/method")
        .header(http::header::HOST, addr.to_string())
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn user_token(account: &str, login: &str) -> String {
    hex::encode(Sha512::digest(format!("{account}{login}Otus").as_bytes()))
}

#[tokio::test]
async fn clients_interests_over_http() {
    let running = start().await;
    let body = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "method": "clients_interests",
        "token": user_token("horns&hoofs", "h&f"),
        "arguments": {"client_ids": [1, 2, 3], "date": "20.07.2017"}
    });

    let (status, headers, bytes) = send(running.addr, post_json(running.addr, &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[http::header::CONTENT_TYPE], "application/json");
    assert!(headers.contains_key(REQUEST_ID_HEADER));

    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 200);
    assert_eq!(body["response"]["2"], json!(["cars", "tag-2"]));
    assert_eq!(body["response"].as_object().unwrap().len(), 3);

    running.stop().await;
}

#[tokio::test]
async fn online_score_over_http() {
    let running = start().await;
    let body = json!({
        "account": "horns&hoofs",
        "login": "h&f",
        "method": "online_score",
        "token": user_token("horns&hoofs", "h&f"),
        "arguments": {"phone": "79175002040", "email": "stupnikov@otus.ru"}
    });

    let (status, _, bytes) = send(running.addr, post_json(running.addr, &body)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"response": {"score": 3.0}, "code": 200}));

    running.stop().await;
}

#[tokio::test]
async fn status_codes_match_envelope_codes() {
    let running = start().await;
    let token = user_token("horns&hoofs", "h&f");

    let cases = [
        (
            json!({"account": "horns&hoofs", "login": "h&f", "method": "online_score", "token": "bad", "arguments": {}}),
            StatusCode::FORBIDDEN,
        ),
        (
            json!({"account": "horns&hoofs", "login": "h&f", "method": "nope", "token": token, "arguments": {}}),
            StatusCode::NOT_FOUND,
        ),
        (
            json!({"account": "horns&hoofs", "login": "h&f", "method": "clients_interests", "token": token, "arguments": {"client_ids": []}}),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({"account": "horns&hoofs", "login": "h&f", "token": token, "arguments": {}}),
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (body, expected) in cases {
        let (status, _, bytes) = send(running.addr, post_json(running.addr, &body)).await;
        assert_eq!(status, expected, "body: {body}");
        let envelope: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope["code"], expected.as_u16());
        assert!(envelope["error"].is_string());
    }

    running.stop().await;
}

#[tokio::test]
async fn request_id_is_echoed() {
    let running = start().await;
    let id = "0190a7c2-5b1e-7c3d-8e4f-123456789abc";
    let req = Request::get("/health")
        .header(http::header::HOST, running.addr.to_string())
        .header(REQUEST_ID_HEADER, id)
        .body(Full::new(Bytes::new()))
        .unwrap();

    let (status, headers, bytes) = send(running.addr, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[REQUEST_ID_HEADER], id);
    assert_eq!(&bytes[..], br#"{"status":"ok"}"#);

    running.stop().await;
}

#[tokio::test]
async fn malformed_json_over_http() {
    let running = start().await;
    let req = Request::post("/method")
        .header(http::header::HOST, running.addr.to_string())
        .body(Full::new(Bytes::from_static(b"{\"login\": ")))
        .unwrap();

    let (status, _, bytes) = send(running.addr, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"error": "Bad Request", "code": 400}));

    running.stop().await;
}

#[test]
fn server_stops_on_trigger_without_traffic() {
    tokio_test::block_on(async {
        let running = start().await;
        running.stop().await;
    });
}
