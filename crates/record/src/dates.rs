//! Date Normalizer
//!
//! Converts date-typed fields between the in-memory representation and the
//! storage representation on the way to a write, and between the persisted
//! representation and the display form on the way to `to_json`. Each
//! direction can be overridden per field; fields without an override use the
//! canonical `YYYY-MM-DD HH:MM:SS` formatter. Null always passes through
//! untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::attributes::Attributes;
use crate::value::{parse_date, Value, STORAGE_DATE_FORMAT};

/// Per-field date conversion: receives the field name and its non-null value
pub type DateFormatter = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// Storage/display conversion rules for one model type's date fields
#[derive(Clone)]
pub struct DateNormalizer {
    fields: Vec<String>,
    format: String,
    storage_overrides: HashMap<String, DateFormatter>,
    display_overrides: HashMap<String, DateFormatter>,
}

impl DateNormalizer {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            format: STORAGE_DATE_FORMAT.to_string(),
            storage_overrides: HashMap::new(),
            display_overrides: HashMap::new(),
        }
    }

    /// Declare a field as date-typed. Declaring twice is a no-op.
    pub fn add_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    /// Change the default storage format (a chrono format string)
    pub fn set_format(&mut self, format: impl Into<String>) {
        self.format = format.into();
    }

    pub fn override_storage(&mut self, field: impl Into<String>, formatter: DateFormatter) {
        self.storage_overrides.insert(field.into(), formatter);
    }

    pub fn override_display(&mut self, field: impl Into<String>, formatter: DateFormatter) {
        self.display_overrides.insert(field.into(), formatter);
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn is_date_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Convert a value into the form written to storage
    pub fn to_storage(&self, field: &str, value: Value) -> Value {
        if value.is_null() {
            return value;
        }

        match self.storage_overrides.get(field) {
            Some(formatter) => formatter(field, value),
            None => self.default_format(value),
        }
    }

    /// Convert a persisted value into its display form
    pub fn to_display(&self, field: &str, value: Value) -> Value {
        if value.is_null() {
            return value;
        }

        match self.display_overrides.get(field) {
            Some(formatter) => formatter(field, value),
            None => self.default_format(value),
        }
    }

    /// Whether two values of `field` store identically. Declared date fields
    /// compare by their storage form, so the model's own formats decide.
    pub fn same_value(&self, field: &str, current: &Value, persisted: &Value) -> bool {
        if !self.is_date_field(field) || current.is_null() || persisted.is_null() {
            return current == persisted;
        }
        self.to_storage(field, current.clone()) == self.to_storage(field, persisted.clone())
    }

    /// Run `to_storage` over every declared date field present in `payload`
    pub fn normalize_for_storage(&self, payload: &mut Attributes) {
        for (field, value) in payload.iter_mut() {
            if self.is_date_field(field) {
                *value = self.to_storage(field, std::mem::take(value));
            }
        }
    }

    /// Parse a value using the configured format, then the canonical one
    pub fn parse(&self, value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::Date(d) => Some(*d),
            Value::String(s) => NaiveDateTime::parse_from_str(s, &self.format)
                .ok()
                .or_else(|| parse_date(s)),
            _ => None,
        }
    }

    fn default_format(&self, value: Value) -> Value {
        match self.parse(&value) {
            Some(date) => Value::String(date.format(&self.format).to_string()),
            // Not something we recognise as a date; leave it for storage to reject
            None => value,
        }
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DateNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateNormalizer")
            .field("fields", &self.fields)
            .field("format", &self.format)
            .field("storage_overrides", &self.storage_overrides.keys().collect::<Vec<_>>())
            .field("display_overrides", &self.display_overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 6, 21)
            .and_then(|d| d.and_hms_milli_opt(14, 5, 9, 731))
            .expect("valid date")
    }

    fn normalizer() -> DateNormalizer {
        let mut dates = DateNormalizer::new();
        dates.add_field("created_at");
        dates.add_field("updated_at");
        dates
    }

    #[test]
    fn test_default_storage_format() {
        let dates = normalizer();
        let stored = dates.to_storage("created_at", Value::Date(sample()));
        assert_eq!(stored, Value::String("2017-06-21 14:05:09".into()));
    }

    #[test]
    fn test_round_trip_is_equivalent_at_second_precision() {
        let dates = normalizer();
        let original = Value::Date(sample());

        let displayed = dates.to_display("created_at", dates.to_storage("created_at", original.clone()));
        assert_eq!(displayed, original);
        assert_eq!(dates.parse(&displayed), sample().with_nanosecond(0));
    }

    #[test]
    fn test_null_round_trips_without_invoking_formatters() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dates = normalizer();
        let counter = calls.clone();
        dates.override_storage(
            "created_at",
            Arc::new(move |_: &str, value: Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                value
            }),
        );

        let out = dates.to_display("created_at", dates.to_storage("created_at", Value::Null));
        assert!(out.is_null());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_display_override_only_applies_to_its_field() {
        let mut dates = normalizer();
        dates.override_display(
            "created_at",
            Arc::new(|_: &str, value: Value| match value.as_date() {
                Some(d) => Value::String(d.format("%d/%m/%Y").to_string()),
                None => value,
            }),
        );

        let stored = Value::String("2017-06-21 14:05:09".into());
        assert_eq!(
            dates.to_display("created_at", stored.clone()),
            Value::String("21/06/2017".into())
        );
        assert_eq!(dates.to_display("updated_at", stored.clone()), stored);
    }

    #[test]
    fn test_custom_storage_format() {
        let mut dates = normalizer();
        dates.set_format("%Y/%m/%d %H:%M");

        let stored = dates.to_storage("updated_at", Value::Date(sample()));
        assert_eq!(stored, Value::String("2017/06/21 14:05".into()));
    }

    #[test]
    fn test_same_value_uses_the_configured_format() {
        let mut dates = normalizer();
        dates.set_format("%d.%m.%Y %H:%M:%S");

        let persisted = Value::from("21.06.2017 14:05:09");
        assert!(dates.same_value("created_at", &Value::Date(sample()), &persisted));
        assert!(!dates.same_value("created_at", &Value::from("22.06.2017 14:05:09"), &persisted));
        assert!(!dates.same_value("created_at", &Value::Null, &persisted));
    }

    #[test]
    fn test_same_value_uses_field_storage_override() {
        let mut dates = normalizer();
        dates.add_field("starts_on");
        dates.override_storage(
            "starts_on",
            Arc::new(|_: &str, value: Value| match value.as_date() {
                Some(d) => Value::String(d.format("%Y-%m-%d").to_string()),
                None => value,
            }),
        );

        let midnight = sample().date().and_hms_opt(0, 0, 0).unwrap();
        assert!(dates.same_value("starts_on", &Value::Date(midnight), &Value::from("2017-06-21")));
        assert!(!dates.same_value("username", &Value::from("a"), &Value::from("b")));
    }

    #[test]
    fn test_normalize_for_storage_skips_non_date_fields() {
        let dates = normalizer();
        let mut payload = Attributes::new();
        payload.insert("username".into(), Value::from("virk"));
        payload.insert("created_at".into(), Value::Date(sample()));

        dates.normalize_for_storage(&mut payload);
        assert_eq!(payload["username"], Value::from("virk"));
        assert!(matches!(payload["created_at"], Value::String(_)));
    }
}
