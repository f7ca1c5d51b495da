//! Typed request shapes.
//!
//! Each type declares its [`Schema`] once; [`decode`] binds raw arguments
//! against that schema and only then builds the typed value.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::error::{SchemaError, ValidationError};
use crate::field::FieldSpec;
use crate::schema::{BoundFields, Schema};

/// A request type that can be built from bound fields.
pub trait FromArguments: Sized {
    /// Builds the schema describing this request. Called once at startup.
    fn schema() -> Result<Schema, SchemaError>;

    /// Builds the request from fields that passed [`schema`](Self::schema).
    fn from_bound(fields: BoundFields) -> Self;
}

/// Validates `raw` against `schema` and builds a `T`.
///
/// `schema` must be the value returned by `T::schema()`.
pub fn decode<T: FromArguments>(
    schema: &Schema,
    raw: &Map<String, Value>,
    clock: &dyn Clock,
) -> Result<T, ValidationError> {
    schema.bind(raw, clock).map(T::from_bound)
}

/// The outer envelope of every API call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    account: Option<String>,
    login: Option<String>,
    method: String,
    token: Option<String>,
    arguments: Map<String, Value>,
}

impl MethodRequest {
    /// Creates an envelope directly, bypassing validation.
    #[must_use]
    pub fn new(
        account: Option<String>,
        login: Option<String>,
        method: impl Into<String>,
        token: Option<String>,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            account,
            login,
            method: method.into(),
            token,
            arguments,
        }
    }

    /// Caller account, if supplied.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Caller login. `None` when sent as null or empty.
    #[must_use]
    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    /// Requested method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Authentication token. `None` when sent as null or empty.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Raw method arguments. Empty when sent as null.
    #[must_use]
    pub const fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    /// Returns `true` if the login equals `admin_login`.
    #[must_use]
    pub fn is_admin_for(&self, admin_login: &str) -> bool {
        self.login.as_deref() == Some(admin_login)
    }
}

impl FromArguments for MethodRequest {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder("method_request")
            .field("account", FieldSpec::char())
            .field("login", FieldSpec::char().required())
            .field("method", FieldSpec::char().required().not_null())
            .field("token", FieldSpec::char().required())
            .field("arguments", FieldSpec::arguments().required())
            .build()
    }

    fn from_bound(mut fields: BoundFields) -> Self {
        Self {
            account: fields.take("account").into_text(),
            login: fields.take("login").into_text(),
            method: fields.take("method").into_text().unwrap_or_default(),
            token: fields.take("token").into_text(),
            arguments: fields.take("arguments").into_mapping().unwrap_or_default(),
        }
    }
}

/// Gender codes accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// Code 0.
    Unknown,
    /// Code 1.
    Male,
    /// Code 2.
    Female,
}

impl Gender {
    /// Maps a wire code to a gender.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Male),
            2 => Some(Self::Female),
            _ => None,
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }

    /// Returns a lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

const SCORE_PAIRS: [(&str, &str); 3] = [
    ("phone", "email"),
    ("first_name", "last_name"),
    ("gender", "birthday"),
];

fn require_score_pair(fields: &BoundFields) -> Result<(), ValidationError> {
    if SCORE_PAIRS.iter().any(|&(a, b)| fields.all_present(&[a, b])) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "at least one pair of arguments must be supplied",
        ))
    }
}

/// Arguments of the `online_score` method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnlineScoreRequest {
    phone: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    birthday: Option<NaiveDate>,
    gender: Option<Gender>,
    has: Vec<&'static str>,
}

impl OnlineScoreRequest {
    /// Phone in canonical string form.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// First name.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Last name.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Birthday.
    #[must_use]
    pub const fn birthday(&self) -> Option<NaiveDate> {
        self.birthday
    }

    /// Gender.
    #[must_use]
    pub const fn gender(&self) -> Option<Gender> {
        self.gender
    }

    /// Names of the arguments that carried a value, in declaration order.
    #[must_use]
    pub fn has(&self) -> &[&'static str] {
        &self.has
    }
}

impl FromArguments for OnlineScoreRequest {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder("online_score")
            .field("phone", FieldSpec::phone())
            .field("email", FieldSpec::email())
            .field("first_name", FieldSpec::char())
            .field("last_name", FieldSpec::char())
            .field("birthday", FieldSpec::birthday())
            .field("gender", FieldSpec::gender())
            .rule("score_pair", require_score_pair)
            .build()
    }

    fn from_bound(mut fields: BoundFields) -> Self {
        let has = fields.present();
        Self {
            phone: fields.take("phone").into_text(),
            email: fields.take("email").into_text(),
            first_name: fields.take("first_name").into_text(),
            last_name: fields.take("last_name").into_text(),
            birthday: fields.date("birthday"),
            gender: fields.integer("gender").and_then(Gender::from_code),
            has,
        }
    }
}

fn require_client_ids(fields: &BoundFields) -> Result<(), ValidationError> {
    match fields.ids("client_ids") {
        Some(ids) if !ids.is_empty() => Ok(()),
        _ => Err(ValidationError::for_field(
            "client_ids",
            "must not be empty",
        )),
    }
}

/// Arguments of the `clients_interests` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientsInterestsRequest {
    client_ids: Vec<u64>,
    date: Option<NaiveDate>,
}

impl ClientsInterestsRequest {
    /// Requested client identifiers; never empty.
    #[must_use]
    pub fn client_ids(&self) -> &[u64] {
        &self.client_ids
    }

    /// Optional reference date.
    #[must_use]
    pub const fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Context entries exposed for logging: `{"nclients": n}`.
    #[must_use]
    pub fn context(&self) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("nclients".into(), Value::from(self.client_ids.len()));
        context
    }
}

impl FromArguments for ClientsInterestsRequest {
    fn schema() -> Result<Schema, SchemaError> {
        Schema::builder("clients_interests")
            .field("client_ids", FieldSpec::client_ids().required().not_null())
            .field("date", FieldSpec::date())
            .rule("client_ids_not_empty", require_client_ids)
            .build()
    }

    fn from_bound(mut fields: BoundFields) -> Self {
        Self {
            client_ids: fields.take("client_ids").into_ids().unwrap_or_default(),
            date: fields.date("date"),
        }
    }
}
