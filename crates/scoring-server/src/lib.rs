//! # Scoring Server
//!
//! HTTP/1.1 transport for the scoring API, built on hyper and tokio.
//!
//! The server owns no business logic: it reads the body, hands the decoded
//! JSON to a shared [`scoring_core::Dispatcher`] and writes the resulting
//! envelope back with the matching status code.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoring_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//! Server::new(config, Arc::new(dispatcher)).run().await?;
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod request_id;
mod server;
pub mod shutdown;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use error::ServerError;
pub use request_id::{request_id_from_headers, set_request_id, REQUEST_ID_HEADER};
pub use server::{HttpResponse, Server, METHOD_PATH};
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};
