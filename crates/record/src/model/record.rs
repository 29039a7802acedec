//! Model instances
//!
//! A `Record<M>` is one row of model type `M`: its attribute store, whether
//! it has been persisted yet, and any relations attached for serialization.
//! Field writes go through the model's setters; reads through its getters.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::attributes::{AttributeStore, Attributes};
use crate::error::ModelResult;
use crate::model::{Model, ModelMeta};
use crate::registry::{self, BootedModel};
use crate::relationships::{HasMany, HasOne};
use crate::value::Value;

pub struct Record<M: Model> {
    model: Arc<BootedModel<M>>,
    pub(crate) store: AttributeStore,
    pub(crate) is_new: bool,
    relations: IndexMap<String, JsonValue>,
}

impl<M: Model> Record<M> {
    /// An empty, never-persisted instance. Boots `M` on first use.
    pub fn new() -> Self {
        Self {
            model: registry::boot::<M>(),
            store: AttributeStore::new(M::NAME),
            is_new: true,
            relations: IndexMap::new(),
        }
    }

    /// A never-persisted instance with `attributes` assigned through setters
    pub fn from_attributes(attributes: Attributes) -> Self {
        let mut record = Self::new();
        for (field, value) in attributes {
            let value = record.meta().apply_setter(&field, value);
            // a fresh store is never frozen
            let _ = record.store.set(field, value);
        }
        record
    }

    /// An instance for a row read from storage
    pub(crate) fn from_row(model: Arc<BootedModel<M>>, row: Attributes) -> Self {
        Self {
            model,
            store: AttributeStore::from_persisted(M::NAME, row),
            is_new: false,
            relations: IndexMap::new(),
        }
    }

    pub fn meta(&self) -> &ModelMeta {
        self.model.meta()
    }

    pub(crate) fn booted(&self) -> &Arc<BootedModel<M>> {
        &self.model
    }

    /// Field value with the model's getter applied
    pub fn get(&self, field: &str) -> Option<Value> {
        self.store
            .get(field)
            .map(|value| self.meta().apply_getter(field, value.clone()))
    }

    /// Field value exactly as stored
    pub fn raw(&self, field: &str) -> Option<&Value> {
        self.store.get(field)
    }

    /// Assign a field through the model's setter. Fails once deleted.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> ModelResult<()> {
        let value = self.meta().apply_setter(field, value.into());
        self.store.set(field, value)
    }

    /// Replace every attribute
    pub fn fill(&mut self, attributes: Attributes) -> ModelResult<()> {
        let attributes = self.apply_setters(attributes);
        self.store.fill(attributes)
    }

    /// Overlay attributes onto the current ones
    pub fn merge(&mut self, attributes: Attributes) -> ModelResult<()> {
        let attributes = self.apply_setters(attributes);
        self.store.merge(attributes)
    }

    fn apply_setters(&self, attributes: Attributes) -> Attributes {
        let meta = self.meta();
        attributes
            .into_iter()
            .map(|(field, value)| {
                let value = meta.apply_setter(&field, value);
                (field, value)
            })
            .collect()
    }

    pub fn attributes(&self) -> &Attributes {
        self.store.attributes()
    }

    pub fn original(&self) -> &Attributes {
        self.store.original()
    }

    /// Fields changed since the last persist
    pub fn dirty(&self) -> Attributes {
        self.store.dirty(&self.meta().dates)
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty(&self.meta().dates)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_deleted(&self) -> bool {
        self.store.is_frozen()
    }

    /// Current primary-key value, if set and not null
    pub fn primary_key_value(&self) -> Option<Value> {
        self.store
            .get(&self.meta().primary_key)
            .filter(|value| !value.is_null())
            .cloned()
    }

    /// Attach serialized related data under `name`
    pub fn set_relation(&mut self, name: impl Into<String>, related: JsonValue) {
        self.relations.insert(name.into(), related);
    }

    pub fn relation(&self, name: &str) -> Option<&JsonValue> {
        self.relations.get(name)
    }

    /// Transport-ready snapshot: visible fields through getters, date fields
    /// in display form, then attached relations
    pub fn to_json(&self) -> JsonValue {
        let meta = self.meta();
        let mut object = Map::new();

        for (field, value) in self.store.attributes() {
            if !meta.is_serialized(field) {
                continue;
            }
            let mut value = value.clone();
            if meta.dates.is_date_field(field) {
                value = meta.dates.to_display(field, value);
            }
            let value = meta.apply_getter(field, value);
            object.insert(field.clone(), value.to_json());
        }

        for (name, related) in &self.relations {
            object.insert(name.clone(), related.clone());
        }

        JsonValue::Object(object)
    }

    /// One-to-one relationship to `R`, keyed by `<model>_id` on `R`'s table
    pub fn has_one<R: Model>(&self) -> HasOne<'_, M, R> {
        HasOne::new(self)
    }

    /// One-to-many relationship to `R`, keyed by `<model>_id` on `R`'s table
    pub fn has_many<R: Model>(&self) -> HasMany<'_, M, R> {
        HasMany::new(self)
    }
}

impl<M: Model> Default for Record<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for Record<M> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            store: self.store.clone(),
            is_new: self.is_new,
            relations: self.relations.clone(),
        }
    }
}

impl<M: Model> fmt::Debug for Record<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(M::NAME)
            .field("attributes", self.store.attributes())
            .field("is_new", &self.is_new)
            .field("is_deleted", &self.is_deleted())
            .finish()
    }
}
