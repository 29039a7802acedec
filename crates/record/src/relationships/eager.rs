//! Eager loading - resolve one relation for a batch of parents
//!
//! Collects the parents' local keys, issues a single `WHERE fk IN (...)`
//! query and distributes the related records back to their parents.

use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::Value as JsonValue;

use super::{RelationshipMeta, RelationshipType};
use crate::database::Database;
use crate::error::ModelResult;
use crate::model::{Model, ModelQuery, Record};
use crate::registry;
use crate::value::Value;

pub struct EagerLoad<P: Model, R: Model> {
    meta: RelationshipMeta,
    _models: PhantomData<fn() -> (P, R)>,
}

impl<P: Model, R: Model> EagerLoad<P, R> {
    pub fn has_one() -> Self {
        Self::for_relation(RelationshipMeta::infer::<P, R>(RelationshipType::HasOne))
    }

    pub fn has_many() -> Self {
        Self::for_relation(RelationshipMeta::infer::<P, R>(RelationshipType::HasMany))
    }

    /// Load a relation described by explicit metadata, e.g. one taken from
    /// a customised `HasOne`/`HasMany`
    pub fn for_relation(meta: RelationshipMeta) -> Self {
        Self {
            meta,
            _models: PhantomData,
        }
    }

    pub fn foreign_key(mut self, column: &str) -> Self {
        self.meta.foreign_key = column.to_string();
        self
    }

    pub fn local_key(mut self, column: &str) -> Self {
        self.meta.local_key = column.to_string();
        self
    }

    /// Related records per parent, in parent order. Has-one relations yield at
    /// most one record per parent. Parents without a key get nothing; when no
    /// parent has a key no query is issued.
    pub async fn load(&self, db: &Database, parents: &[Record<P>]) -> ModelResult<Vec<Vec<Record<R>>>> {
        let parent_keys: Vec<Option<Value>> = parents
            .iter()
            .map(|parent| parent.raw(&self.meta.local_key).filter(|v| !v.is_null()).cloned())
            .collect();

        let mut seen = HashMap::new();
        for key in parent_keys.iter().flatten() {
            seen.entry(key.to_string()).or_insert_with(|| key.clone());
        }
        if seen.is_empty() {
            return Ok(parents.iter().map(|_| Vec::new()).collect());
        }

        let related_key = registry::boot::<R>().meta().primary_key.clone();
        let related = ModelQuery::<R>::new(db)?
            .where_in(&self.meta.foreign_key, seen.into_values())
            .order_by(&related_key)
            .fetch()
            .await?;

        let mut groups: HashMap<String, Vec<Record<R>>> = HashMap::new();
        for record in related {
            let Some(key) = record.raw(&self.meta.foreign_key) else {
                continue;
            };
            groups.entry(key.to_string()).or_default().push(record);
        }

        Ok(parent_keys
            .iter()
            .map(|key| {
                let mut group = key
                    .as_ref()
                    .and_then(|key| groups.get(&key.to_string()))
                    .cloned()
                    .unwrap_or_default();
                if self.meta.kind == RelationshipType::HasOne {
                    group.truncate(1);
                }
                group
            })
            .collect())
    }

    /// Load and attach the serialized relation to each parent under `name`:
    /// an object or null for has-one, an array for has-many
    pub async fn load_into(&self, db: &Database, name: &str, parents: &mut [Record<P>]) -> ModelResult<()> {
        let groups = self.load(db, parents).await?;

        for (parent, group) in parents.iter_mut().zip(groups) {
            let json = match self.meta.kind {
                RelationshipType::HasOne => group
                    .first()
                    .map(Record::to_json)
                    .unwrap_or(JsonValue::Null),
                RelationshipType::HasMany => {
                    JsonValue::Array(group.iter().map(Record::to_json).collect())
                }
            };
            parent.set_relation(name, json);
        }
        Ok(())
    }
}
