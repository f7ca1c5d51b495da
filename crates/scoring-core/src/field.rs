//! Field validation rules.
//!
//! A [`FieldSpec`] describes how one value in a request must look: whether it
//! may be omitted, whether it may be null, and which [`FieldKind`] check it
//! must pass. It never holds request data; the same spec is reused for every
//! request.
//!
//! Validation is two-phase and fail-fast:
//!
//! 1. **Presence** - an absent required field fails with "field is required";
//!    a null or empty value on a non-nullable field fails with "field cannot
//!    be null"; an absent or empty value that the policy accepts short-circuits
//!    to [`FieldValue::Null`].
//! 2. **Kind** - the value goes through the check selected by its kind.

use chrono::NaiveDate;
use serde_json::Value;

use crate::clock::Clock;
use crate::error::ValidationError;
use crate::value::FieldValue;

/// Date format accepted by date and birthday fields.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Required length of a phone number in canonical string form.
pub const PHONE_LENGTH: usize = 11;

/// Required first character of a phone number.
pub const PHONE_PREFIX: char = '7';

/// Upper age bound (exclusive) accepted by birthday fields, in years.
pub const MAX_AGE_YEARS: u32 = 70;

/// The closed set of value checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text string.
    Char,
    /// Integer (booleans and floats are rejected).
    Digit,
    /// `DD.MM.YYYY` date.
    Date,
    /// Text containing `@`.
    Email,
    /// 11 characters starting with `7`; string or integer input.
    Phone,
    /// Date younger than 70 years and not in the future.
    Birthday,
    /// Integer in {0, 1, 2}.
    Gender,
    /// List of non-negative integers.
    ClientIds,
    /// JSON object.
    Arguments,
}

type Check = fn(&Value, &dyn Clock) -> Result<FieldValue, ValidationError>;

impl FieldKind {
    /// Returns a short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Digit => "digit",
            Self::Date => "date",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Birthday => "birthday",
            Self::Gender => "gender",
            Self::ClientIds => "client_ids",
            Self::Arguments => "arguments",
        }
    }

    const fn check(self) -> Check {
        match self {
            Self::Char => check_char,
            Self::Digit => check_digit,
            Self::Date => check_date,
            Self::Email => check_email,
            Self::Phone => check_phone,
            Self::Birthday => check_birthday,
            Self::Gender => check_gender,
            Self::ClientIds => check_client_ids,
            Self::Arguments => check_arguments,
        }
    }
}

/// Immutable validation rule for a single value.
///
/// Fields are optional and nullable unless told otherwise.
///
/// # Example
///
/// ```
/// use scoring_core::{FieldSpec, FieldValue, SystemClock};
///
/// let spec = FieldSpec::phone();
/// let value = spec.validate(Some(&serde_json::json!(79175002040_u64)), &SystemClock).unwrap();
/// assert_eq!(value, FieldValue::Text("79175002040".into()));
///
/// let required = FieldSpec::char().required();
/// assert!(required.validate(None, &SystemClock).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    kind: FieldKind,
    required: bool,
    nullable: bool,
}

impl FieldSpec {
    /// Creates an optional, nullable spec of the given kind.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            nullable: true,
        }
    }

    /// Text field.
    #[must_use]
    pub const fn char() -> Self {
        Self::new(FieldKind::Char)
    }

    /// Integer field.
    #[must_use]
    pub const fn digit() -> Self {
        Self::new(FieldKind::Digit)
    }

    /// `DD.MM.YYYY` date field.
    #[must_use]
    pub const fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// Email field.
    #[must_use]
    pub const fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    /// Phone field.
    #[must_use]
    pub const fn phone() -> Self {
        Self::new(FieldKind::Phone)
    }

    /// Birthday field.
    #[must_use]
    pub const fn birthday() -> Self {
        Self::new(FieldKind::Birthday)
    }

    /// Gender field.
    #[must_use]
    pub const fn gender() -> Self {
        Self::new(FieldKind::Gender)
    }

    /// Client id list field.
    #[must_use]
    pub const fn client_ids() -> Self {
        Self::new(FieldKind::ClientIds)
    }

    /// Free-form mapping field.
    #[must_use]
    pub const fn arguments() -> Self {
        Self::new(FieldKind::Arguments)
    }

    /// Marks the field as required: the key must be present.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as non-nullable: null and empty values are rejected.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Returns the field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns whether the key must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns whether null or empty values are accepted.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Validates a raw value; `None` means the key was absent.
    ///
    /// The returned error carries no field name; the schema adds it.
    pub fn validate(
        &self,
        raw: Option<&Value>,
        clock: &dyn Clock,
    ) -> Result<FieldValue, ValidationError> {
        let Some(value) = raw else {
            if self.required {
                return Err(ValidationError::new("field is required"));
            }
            return Ok(FieldValue::Null);
        };

        if is_empty(value) {
            if !self.nullable {
                return Err(ValidationError::new("field cannot be null"));
            }
            return Ok(FieldValue::Null);
        }

        (self.kind.check())(value, clock)
    }
}

/// Null and the empty string count as "no value". Empty lists and objects do
/// not: they are structurally valid and left to cross-field rules.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn check_char(value: &Value, _clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    match value {
        Value::String(s) => Ok(FieldValue::Text(s.clone())),
        _ => Err(ValidationError::new("must be a string")),
    }
}

fn check_digit(value: &Value, _clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or_else(|| ValidationError::new("integer out of range")),
        _ => Err(ValidationError::new("must be an integer")),
    }
}

/// `DD.MM.YYYY` exactly: chrono alone accepts short, signed and padded years.
fn has_date_shape(s: &str) -> bool {
    s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            2 | 5 => b == b'.',
            _ => b.is_ascii_digit(),
        })
}

fn parse_date(value: &Value) -> Result<NaiveDate, ValidationError> {
    value
        .as_str()
        .filter(|s| has_date_shape(s))
        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        .ok_or_else(|| ValidationError::new("bad date format"))
}

fn check_date(value: &Value, _clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    parse_date(value).map(FieldValue::Date)
}

fn check_email(value: &Value, clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    let text = check_char(value, clock)?;
    match text.as_text() {
        Some(s) if s.contains('@') => Ok(text),
        _ => Err(ValidationError::new("invalid email address")),
    }
}

fn check_phone(value: &Value, _clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    let canonical = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => return Err(ValidationError::new("must be a string or an integer")),
    };

    if canonical.chars().count() != PHONE_LENGTH || !canonical.starts_with(PHONE_PREFIX) {
        return Err(ValidationError::new(format!(
            "must be {PHONE_LENGTH} characters starting with {PHONE_PREFIX}"
        )));
    }
    Ok(FieldValue::Text(canonical))
}

fn check_birthday(value: &Value, clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    let date = parse_date(value)?;
    match clock.today().years_since(date) {
        None => Err(ValidationError::new("not yet born")),
        Some(age) if age >= MAX_AGE_YEARS => Err(ValidationError::new("too old")),
        Some(_) => Ok(FieldValue::Date(date)),
    }
}

fn check_gender(value: &Value, clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    match check_digit(value, clock) {
        Ok(FieldValue::Integer(code @ 0..=2)) => Ok(FieldValue::Integer(code)),
        _ => Err(ValidationError::new("must be one of 0, 1, 2")),
    }
}

fn check_client_ids(value: &Value, _clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::new("must be a list"));
    };

    items
        .iter()
        .map(|item| match item {
            Value::Number(n) if n.is_u64() => n.as_u64(),
            _ => None,
        })
        .collect::<Option<Vec<u64>>>()
        .map(FieldValue::Ids)
        .ok_or_else(|| ValidationError::new("must contain only non-negative integers"))
}

fn check_arguments(value: &Value, _clock: &dyn Clock) -> Result<FieldValue, ValidationError> {
    match value {
        Value::Object(map) => Ok(FieldValue::Mapping(map.clone())),
        _ => Err(ValidationError::new("must be an object")),
    }
}
