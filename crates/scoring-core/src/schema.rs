//! Schemas: ordered sets of field rules plus cross-field rules.
//!
//! Binding raw arguments against a [`Schema`] is a two-stage build:
//!
//! 1. Every field is validated on its own, in declaration order, into a
//!    [`BoundFields`] staging value. The first failure aborts.
//! 2. The schema's [`CrossFieldRule`]s run against the staged fields.
//!
//! Only a value that passed both stages is handed out, so a partially valid
//! request is never observable.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::error::{SchemaError, ValidationError};
use crate::field::FieldSpec;
use crate::value::FieldValue;

/// Signature of a cross-field check.
pub type RuleFn = fn(&BoundFields) -> Result<(), ValidationError>;

/// A named check that runs after every field passed on its own.
#[derive(Debug, Clone, Copy)]
pub struct CrossFieldRule {
    name: &'static str,
    check: RuleFn,
}

impl CrossFieldRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(name: &'static str, check: RuleFn) -> Self {
        Self { name, check }
    }

    /// Returns the rule name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the rule.
    pub fn check(&self, fields: &BoundFields) -> Result<(), ValidationError> {
        (self.check)(fields)
    }
}

/// Named, ordered collection of field rules describing one request shape.
///
/// Schemas are built once at startup and shared read-only.
///
/// # Example
///
/// ```
/// use scoring_core::{FieldSpec, Schema, SystemClock};
///
/// let schema = Schema::builder("greeting")
///     .field("name", FieldSpec::char().required())
///     .build()
///     .unwrap();
///
/// let raw = serde_json::json!({"name": "Ada"});
/// let bound = schema.bind(raw.as_object().unwrap(), &SystemClock).unwrap();
/// assert_eq!(bound.text("name"), Some("Ada"));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: IndexMap<&'static str, FieldSpec>,
    rules: Vec<CrossFieldRule>,
}

impl Schema {
    /// Starts a schema definition.
    #[must_use]
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Returns the schema name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Iterates fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &FieldSpec)> + '_ {
        self.fields.iter().map(|(name, spec)| (*name, spec))
    }

    /// Returns the spec for a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the cross-field rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[CrossFieldRule] {
        &self.rules
    }

    /// Validates `raw` against this schema, returning the first error.
    ///
    /// Keys in `raw` that the schema does not declare are ignored.
    pub fn bind(
        &self,
        raw: &Map<String, Value>,
        clock: &dyn Clock,
    ) -> Result<BoundFields, ValidationError> {
        let mut values = IndexMap::with_capacity(self.fields.len());
        for (&name, spec) in &self.fields {
            let value = spec
                .validate(raw.get(name), clock)
                .map_err(|e| e.with_field(name))?;
            values.insert(name, BoundValue { spec: *spec, value });
        }

        let bound = BoundFields {
            schema: self.name,
            values,
        };

        for rule in &self.rules {
            if let Err(error) = rule.check(&bound) {
                tracing::debug!(schema = self.name, rule = rule.name(), %error, "cross-field rule failed");
                return Err(error);
            }
        }

        Ok(bound)
    }
}

/// Builder for [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: &'static str,
    fields: IndexMap<&'static str, FieldSpec>,
    rules: Vec<CrossFieldRule>,
    duplicate: Option<&'static str>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: IndexMap::new(),
            rules: Vec::new(),
            duplicate: None,
        }
    }

    /// Declares a field. Declaring a name twice makes [`build`](Self::build) fail.
    #[must_use]
    pub fn field(mut self, name: &'static str, spec: FieldSpec) -> Self {
        if self.fields.insert(name, spec).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(name);
        }
        self
    }

    /// Adds a cross-field rule.
    #[must_use]
    pub fn rule(mut self, name: &'static str, check: RuleFn) -> Self {
        self.rules.push(CrossFieldRule::new(name, check));
        self
    }

    /// Finishes the schema.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if let Some(field) = self.duplicate {
            return Err(SchemaError::DuplicateField {
                schema: self.name.to_string(),
                field: field.to_string(),
            });
        }
        if self.fields.is_empty() {
            return Err(SchemaError::Empty(self.name.to_string()));
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
            rules: self.rules,
        })
    }
}

/// A field rule paired with the value supplied for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundValue {
    spec: FieldSpec,
    value: FieldValue,
}

impl BoundValue {
    /// Returns the rule the value passed.
    #[must_use]
    pub const fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Returns the validated value.
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Validated values for every field of a schema, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFields {
    schema: &'static str,
    values: IndexMap<&'static str, BoundValue>,
}

impl BoundFields {
    /// Returns the name of the schema that produced these values.
    #[must_use]
    pub const fn schema(&self) -> &'static str {
        self.schema
    }

    /// Returns the bound value for a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.values.get(name)
    }

    /// Returns the validated value for a field.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name).map(BoundValue::value)
    }

    /// Returns `true` if the field holds a non-null value.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.value(name).is_some_and(|v| !v.is_null())
    }

    /// Returns `true` if every named field holds a non-null value.
    #[must_use]
    pub fn all_present(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.is_present(name))
    }

    /// Names of fields holding a non-null value, in declaration order.
    #[must_use]
    pub fn present(&self) -> Vec<&'static str> {
        self.values
            .iter()
            .filter(|(_, bound)| !bound.value.is_null())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Returns a text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(FieldValue::as_text)
    }

    /// Returns an integer field.
    #[must_use]
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(FieldValue::as_integer)
    }

    /// Returns a date field.
    #[must_use]
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.value(name).and_then(FieldValue::as_date)
    }

    /// Returns an id list field.
    #[must_use]
    pub fn ids(&self, name: &str) -> Option<&[u64]> {
        self.value(name).and_then(FieldValue::as_ids)
    }

    /// Moves a value out, leaving `Null` behind.
    pub fn take(&mut self, name: &str) -> FieldValue {
        self.values
            .get_mut(name)
            .map(|bound| std::mem::take(&mut bound.value))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn pair_rule(fields: &BoundFields) -> Result<(), ValidationError> {
        if fields.all_present(&["a", "b"]) {
            Ok(())
        } else {
            Err(ValidationError::new("a and b go together"))
        }
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = Schema::builder("dup")
            .field("a", FieldSpec::char())
            .field("a", FieldSpec::digit())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                schema: "dup".into(),
                field: "a".into()
            }
        );
    }

    #[test]
    fn test_empty_schema_is_rejected() {
        assert_eq!(
            Schema::builder("none").build().unwrap_err(),
            SchemaError::Empty("none".into())
        );
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = Schema::builder("ordered")
            .field("z", FieldSpec::char())
            .field("a", FieldSpec::char())
            .field("m", FieldSpec::char())
            .build()
            .unwrap();
        let names: Vec<_> = schema.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_first_error_in_declaration_order_wins() {
        let schema = Schema::builder("ordered")
            .field("first", FieldSpec::digit().required())
            .field("second", FieldSpec::char().required())
            .build()
            .unwrap();

        let err = schema.bind(&object(json!({})), &SystemClock).unwrap_err();
        assert_eq!(err.field(), Some("first"));
        assert_eq!(err.to_string(), "first: field is required");
    }

    #[test]
    fn test_rules_run_after_fields() {
        let schema = Schema::builder("pair")
            .field("a", FieldSpec::char())
            .field("b", FieldSpec::digit())
            .rule("a_with_b", pair_rule)
            .build()
            .unwrap();

        // Field error is reported before the rule gets a chance.
        let err = schema
            .bind(&object(json!({"a": "x", "b": "not-a-number"})), &SystemClock)
            .unwrap_err();
        assert_eq!(err.field(), Some("b"));

        let err = schema
            .bind(&object(json!({"a": "x"})), &SystemClock)
            .unwrap_err();
        assert_eq!(err.to_string(), "a and b go together");

        let bound = schema
            .bind(&object(json!({"a": "x", "b": 3})), &SystemClock)
            .unwrap();
        assert_eq!(bound.text("a"), Some("x"));
        assert_eq!(bound.integer("b"), Some(3));
        assert_eq!(bound.schema(), "pair");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let schema = Schema::builder("one")
            .field("a", FieldSpec::char())
            .build()
            .unwrap();
        let bound = schema
            .bind(&object(json!({"a": "x", "extra": [1, 2]})), &SystemClock)
            .unwrap();
        assert_eq!(bound.present(), vec!["a"]);
        assert!(bound.get("extra").is_none());
    }

    #[test]
    fn test_take_leaves_null() {
        let schema = Schema::builder("one")
            .field("a", FieldSpec::char())
            .build()
            .unwrap();
        let mut bound = schema
            .bind(&object(json!({"a": "x"})), &SystemClock)
            .unwrap();
        assert_eq!(bound.take("a"), FieldValue::Text("x".into()));
        assert!(!bound.is_present("a"));
        assert_eq!(bound.take("missing"), FieldValue::Null);
    }
}
