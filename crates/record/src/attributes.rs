//! Attribute Store - per-instance field bag with dirty tracking
//!
//! Holds the current attribute values next to the values as last persisted.
//! The dirty set is every current attribute whose value differs from its
//! persisted counterpart: by value equality (see [`Value`]), and for declared
//! date fields by their storage form (see [`DateNormalizer::same_value`]).
//! Once frozen, the store rejects writes but keeps serving reads.

use indexmap::IndexMap;

use crate::dates::DateNormalizer;
use crate::error::{ModelError, ModelResult};
use crate::value::Value;

/// Ordered mapping of field name to value
pub type Attributes = IndexMap<String, Value>;

/// Attribute storage for a single model instance
#[derive(Debug, Clone)]
pub struct AttributeStore {
    model: &'static str,
    attributes: Attributes,
    original: Attributes,
    frozen: bool,
}

impl AttributeStore {
    /// Create an empty store for a never-persisted instance
    pub fn new(model: &'static str) -> Self {
        Self {
            model,
            attributes: Attributes::new(),
            original: Attributes::new(),
            frozen: false,
        }
    }

    /// Create a store from a persisted row; the row becomes the baseline
    pub fn from_persisted(model: &'static str, row: Attributes) -> Self {
        Self {
            model,
            original: row.clone(),
            attributes: row,
            frozen: false,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.attributes.contains_key(field)
    }

    /// Write a field. Unknown fields are stored as new attributes.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> ModelResult<()> {
        self.ensure_writable()?;
        self.attributes.insert(field.into(), value);
        Ok(())
    }

    /// Replace every attribute with `attributes`
    pub fn fill(&mut self, attributes: Attributes) -> ModelResult<()> {
        self.ensure_writable()?;
        self.attributes = attributes;
        Ok(())
    }

    /// Overlay `attributes` on top of the current ones
    pub fn merge(&mut self, attributes: Attributes) -> ModelResult<()> {
        self.ensure_writable()?;
        self.attributes.extend(attributes);
        Ok(())
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn original(&self) -> &Attributes {
        &self.original
    }

    /// Fields whose current value differs from the persisted one
    pub fn dirty(&self, dates: &DateNormalizer) -> Attributes {
        self.attributes
            .iter()
            .filter(|(field, value)| self.changed(field, value, dates))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    pub fn is_dirty(&self, dates: &DateNormalizer) -> bool {
        self.attributes
            .iter()
            .any(|(field, value)| self.changed(field, value, dates))
    }

    pub fn is_field_dirty(&self, field: &str, dates: &DateNormalizer) -> bool {
        match self.attributes.get(field) {
            Some(value) => self.changed(field, value, dates),
            None => false,
        }
    }

    fn changed(&self, field: &str, value: &Value, dates: &DateNormalizer) -> bool {
        match self.original.get(field) {
            Some(persisted) => !dates.same_value(field, value, persisted),
            None => true,
        }
    }

    /// Snapshot the current attributes as the new persisted baseline
    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    /// Replace both current and persisted values with a freshly read row
    pub fn reset_to(&mut self, row: Attributes) {
        self.original = row.clone();
        self.attributes = row;
    }

    /// Stop accepting writes
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_writable(&self) -> ModelResult<()> {
        if self.frozen {
            return Err(ModelError::frozen(self.model));
        }
        Ok(())
    }
}

/// Build an [`Attributes`] map: `attrs! { "username" => "virk", "age" => 26 }`
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Attributes::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut attributes = $crate::Attributes::new();
        $(
            attributes.insert(::std::string::String::from($field), $crate::Value::from($value));
        )+
        attributes
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_dates() -> DateNormalizer {
        DateNormalizer::new()
    }

    fn persisted() -> AttributeStore {
        let mut row = Attributes::new();
        row.insert("id".into(), Value::Int(1));
        row.insert("username".into(), Value::from("virk"));
        AttributeStore::from_persisted("User", row)
    }

    #[test]
    fn test_new_store_is_dirty_for_every_assigned_field() {
        let mut store = AttributeStore::new("User");
        store.set("username", Value::from("virk")).unwrap();
        store.set("age", Value::Int(26)).unwrap();

        let dirty = store.dirty(&no_dates());
        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty.get("username"), Some(&Value::from("virk")));
    }

    #[test]
    fn test_persisted_store_starts_clean() {
        let store = persisted();
        assert!(!store.is_dirty(&no_dates()));
        assert!(store.dirty(&no_dates()).is_empty());
    }

    #[test]
    fn test_rewriting_same_value_is_not_dirty() {
        let mut store = persisted();
        store.set("username", Value::from("virk")).unwrap();
        assert!(!store.is_dirty(&no_dates()));

        store.set("username", Value::from("romain")).unwrap();
        assert!(store.is_field_dirty("username", &no_dates()));
        assert!(!store.is_field_dirty("id", &no_dates()));
        assert_eq!(store.dirty(&no_dates()).len(), 1);
    }

    #[test]
    fn test_sync_original_clears_dirty_set() {
        let mut store = persisted();
        store.set("email", Value::from("foo@bar.com")).unwrap();
        assert!(store.is_dirty(&no_dates()));

        store.sync_original();
        assert!(!store.is_dirty(&no_dates()));
        assert_eq!(store.original(), store.attributes());
    }

    #[test]
    fn test_declared_date_fields_compare_in_storage_form() {
        let mut dates = DateNormalizer::new();
        dates.add_field("created_at");
        dates.set_format("%d.%m.%Y %H:%M:%S");

        let mut row = Attributes::new();
        row.insert("created_at".into(), Value::from("21.06.2017 14:05:09"));
        let mut store = AttributeStore::from_persisted("User", row);

        let same = chrono::NaiveDate::from_ymd_opt(2017, 6, 21)
            .and_then(|d| d.and_hms_opt(14, 5, 9))
            .unwrap();
        store.set("created_at", Value::Date(same)).unwrap();
        assert!(!store.is_dirty(&dates));
        assert!(store.dirty(&dates).is_empty());

        store.set("created_at", Value::Date(same + chrono::Duration::days(1))).unwrap();
        assert!(store.is_field_dirty("created_at", &dates));
    }

    #[test]
    fn test_frozen_store_rejects_writes_but_serves_reads() {
        let mut store = persisted();
        store.freeze();

        let err = store.set("username", Value::from("other")).unwrap_err();
        assert!(err.is_frozen());
        assert!(store.merge(Attributes::new()).is_err());
        assert_eq!(store.get("username"), Some(&Value::from("virk")));
    }

    #[test]
    fn test_attrs_macro_keeps_insertion_order() {
        let attributes = crate::attrs! { "username" => "virk", "age" => 26, "admin" => false };
        let fields: Vec<&str> = attributes.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["username", "age", "admin"]);
        assert_eq!(attributes["age"], Value::Int(26));
    }

    #[test]
    fn test_merge_overlays_and_fill_replaces() {
        let mut store = persisted();
        let mut patch = Attributes::new();
        patch.insert("country".into(), Value::from("ind"));

        store.merge(patch.clone()).unwrap();
        assert_eq!(store.attributes().len(), 3);

        store.fill(patch).unwrap();
        assert_eq!(store.attributes().len(), 1);
        assert!(!store.contains("username"));
    }
}
