//! # Scoring Core
//!
//! Request validation, authentication and method dispatch for the scoring API.
//!
//! This crate holds everything between "a JSON document arrived" and "a JSON
//! document goes back", without doing any I/O itself:
//!
//! - [`FieldSpec`] / [`FieldKind`] - Per-value validation rules
//! - [`Schema`] - Ordered, named set of field rules plus cross-field rules
//! - [`MethodRequest`], [`OnlineScoreRequest`], [`ClientsInterestsRequest`] - Typed request shapes
//! - [`AuthGuard`] - SHA-512 token check for regular and admin callers
//! - [`MethodRegistry`] / [`Dispatcher`] - Method routing and error-to-status mapping
//! - [`Store`] - The backend collaborator that computes business answers
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoring_core::{AuthGuard, AuthSettings, Dispatcher, MethodRegistry, RequestContext, SystemClock};
//!
//! let clock = Arc::new(SystemClock);
//! let dispatcher = Dispatcher::new(
//!     MethodRegistry::standard()?,
//!     AuthGuard::new(AuthSettings::default(), clock.clone()),
//!     store,
//!     clock,
//! )?;
//!
//! let mut ctx = RequestContext::new();
//! let outcome = dispatcher.dispatch(&body, &mut ctx).await;
//! ```

#![forbid(unsafe_code)]

mod auth;
mod clock;
mod context;
mod dispatch;
mod error;
mod field;
pub mod handlers;
mod registry;
mod request;
mod response;
mod schema;
mod store;
mod value;

pub use auth::{AuthGuard, AuthSettings, DEFAULT_ADMIN_LOGIN, DEFAULT_ADMIN_SALT, DEFAULT_SALT};
pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{RequestContext, RequestId};
pub use dispatch::Dispatcher;
pub use error::{
    status_phrase, SchemaError, ScoringError, ScoringResult, StoreError, ValidationError,
};
pub use field::{FieldKind, FieldSpec, DATE_FORMAT};
pub use handlers::MethodHandler;
pub use registry::{MethodRegistry, CLIENTS_INTERESTS, ONLINE_SCORE};
pub use request::{
    decode, ClientsInterestsRequest, FromArguments, Gender, MethodRequest, OnlineScoreRequest,
};
pub use response::{Outcome, ResponseEnvelope};
pub use schema::{BoundFields, BoundValue, CrossFieldRule, RuleFn, Schema, SchemaBuilder};
pub use store::Store;
pub use value::FieldValue;
