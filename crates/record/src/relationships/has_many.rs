//! HasMany Relationship - the related table holds any number of rows pointing at the parent

use std::marker::PhantomData;

use super::{parent_key, RelationshipMeta, RelationshipType};
use crate::attributes::Attributes;
use crate::database::Database;
use crate::error::ModelResult;
use crate::model::{Model, ModelQuery, Record};

pub struct HasMany<'a, P: Model, R: Model> {
    parent: &'a Record<P>,
    meta: RelationshipMeta,
    _related: PhantomData<fn() -> R>,
}

impl<'a, P: Model, R: Model> HasMany<'a, P, R> {
    pub fn new(parent: &'a Record<P>) -> Self {
        Self {
            parent,
            meta: RelationshipMeta::infer::<P, R>(RelationshipType::HasMany),
            _related: PhantomData,
        }
    }

    /// Override the column on the related table
    pub fn foreign_key(mut self, column: &str) -> Self {
        self.meta.foreign_key = column.to_string();
        self
    }

    /// Override the referenced column on the parent
    pub fn local_key(mut self, column: &str) -> Self {
        self.meta.local_key = column.to_string();
        self
    }

    pub fn meta(&self) -> &RelationshipMeta {
        &self.meta
    }

    /// Related-table query constrained to this parent
    pub fn query(&self, db: &Database) -> ModelResult<ModelQuery<R>> {
        let key = parent_key(self.parent, &self.meta)?;
        Ok(ModelQuery::new(db)?.where_eq(&self.meta.foreign_key, key))
    }

    /// Every related record, in storage order
    pub async fn fetch(&self, db: &Database) -> ModelResult<Vec<Record<R>>> {
        self.query(db)?.fetch().await
    }

    /// Create a related record pointing at the parent
    pub async fn create(&self, db: &Database, attributes: Attributes) -> ModelResult<Record<R>> {
        let key = parent_key(self.parent, &self.meta)?;
        let mut record = Record::<R>::from_attributes(attributes);
        record.set(&self.meta.foreign_key, key)?;
        record.save(db).await?;
        Ok(record)
    }
}
