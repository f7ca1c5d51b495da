//! Validated field values.

use chrono::NaiveDate;
use serde_json::{Map, Value};

/// A value that has passed its [`FieldSpec`](crate::FieldSpec).
///
/// `Null` covers both "key absent" and "explicitly null or empty" once the
/// field's presence policy has accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    /// No usable value.
    #[default]
    Null,
    /// Text (char, email, phone in canonical string form).
    Text(String),
    /// Integer (digit, gender).
    Integer(i64),
    /// Calendar date (date, birthday).
    Date(NaiveDate),
    /// Client identifiers.
    Ids(Vec<u64>),
    /// Free-form key/value mapping.
    Mapping(Map<String, Value>),
}

impl FieldValue {
    /// Returns `true` if no value was supplied.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the date, if this is a date value.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the identifiers, if this is an id list.
    #[must_use]
    pub fn as_ids(&self) -> Option<&[u64]> {
        match self {
            Self::Ids(ids) => Some(ids),
            _ => None,
        }
    }

    /// Returns the mapping, if this is a mapping value.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Consumes the value, returning owned text.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the value, returning the owned id list.
    #[must_use]
    pub fn into_ids(self) -> Option<Vec<u64>> {
        match self {
            Self::Ids(ids) => Some(ids),
            _ => None,
        }
    }

    /// Consumes the value, returning the owned mapping.
    #[must_use]
    pub fn into_mapping(self) -> Option<Map<String, Value>> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }
}
