//! HasOne Relationship - the related table holds one row pointing at the parent

use std::marker::PhantomData;

use super::{parent_key, RelationshipMeta, RelationshipType};
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelQuery, Record};

pub struct HasOne<'a, P: Model, R: Model> {
    parent: &'a Record<P>,
    meta: RelationshipMeta,
    _related: PhantomData<fn() -> R>,
}

impl<'a, P: Model, R: Model> HasOne<'a, P, R> {
    pub fn new(parent: &'a Record<P>) -> Self {
        Self {
            parent,
            meta: RelationshipMeta::infer::<P, R>(RelationshipType::HasOne),
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

    /// The related record, if there is one
    pub async fn fetch(&self, db: &Database) -> ModelResult<Option<Record<R>>> {
        self.query(db)?.first().await
    }

    pub async fn fetch_or_fail(&self, db: &Database) -> ModelResult<Record<R>> {
        let key = parent_key(self.parent, &self.meta)?;
        self.fetch(db).await?.ok_or_else(|| {
            ModelError::not_found(R::NAME, format!("{} = {}", self.meta.foreign_key, key))
        })
    }
}
