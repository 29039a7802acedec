//! Persistence Engine - insert vs update decision, timestamps, delete, reload
//!
//! Hook order per path:
//! - insert: before_create, before_save, INSERT, after_save, after_create
//! - update: before_update, before_save, UPDATE (skipped when nothing is
//!   dirty), after_save, after_update
//! - delete: before_delete, DELETE, after_delete
//!
//! A failing before-hook skips the write. A failing after-hook surfaces its
//! error, but the write it follows has already happened.

use chrono::{NaiveDateTime, SubsecRound, Utc};
use tracing::debug;

use crate::connection::Connection;
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::events::{flow, HookPoint};
use crate::hooks;
use crate::model::{Model, Record};
use crate::query::QueryBuilder;
use crate::value::Value;

/// Current time at the storage precision
fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

impl<M: Model> Record<M> {
    /// Persist the instance: INSERT when new, UPDATE of the dirty fields
    /// otherwise. Returns whether a statement was issued.
    pub async fn save(&mut self, db: &Database) -> ModelResult<bool> {
        if self.is_deleted() {
            return Err(ModelError::frozen(M::NAME));
        }

        let connection = db.connection_for(self.meta())?;
        if self.is_new {
            self.insert(connection.as_ref()).await?;
            Ok(true)
        } else {
            self.update(connection.as_ref()).await
        }
    }

    async fn insert(&mut self, connection: &dyn Connection) -> ModelResult<()> {
        hooks::run_all(&flow::CREATE_BEFORE, self).await?;

        let meta = self.booted().meta().clone();
        let timestamp = Value::Date(now());
        for column in meta.created_at.iter().chain(meta.updated_at.iter()) {
            self.store.set(column.as_str(), timestamp.clone())?;
        }

        let mut payload = self.store.attributes().clone();
        meta.dates.normalize_for_storage(&mut payload);

        let mut query = QueryBuilder::insert_into(&meta.table)
            .date_columns(meta.dates.fields())
            .set_values(payload);
        if meta.incrementing {
            query = query.returning(&meta.primary_key);
        }

        let generated = connection.insert(&query).await?;
        if let Some(key) = generated.filter(|key| !key.is_null()) {
            self.store.set(meta.primary_key.as_str(), key)?;
        }

        self.is_new = false;
        self.store.sync_original();

        hooks::run_all(&flow::CREATE_AFTER, self).await
    }

    async fn update(&mut self, connection: &dyn Connection) -> ModelResult<bool> {
        hooks::run_all(&flow::UPDATE_BEFORE, self).await?;

        let mut dirty = self.store.dirty(&self.meta().dates);
        let wrote = !dirty.is_empty();

        if wrote {
            let meta = self.booted().meta().clone();
            if let Some(column) = &meta.updated_at {
                let timestamp = Value::Date(now());
                self.store.set(column.as_str(), timestamp.clone())?;
                dirty.insert(column.clone(), timestamp);
            }
            meta.dates.normalize_for_storage(&mut dirty);

            let key = self.persisted_key("update")?;
            let query = QueryBuilder::table(&meta.table)
                .date_columns(meta.dates.fields())
                .where_eq(&meta.primary_key, key)
                .update()
                .set_values(dirty);
            connection.execute(&query).await?;

            self.store.sync_original();
        } else {
            debug!(model = M::NAME, "no dirty attributes, skipping update");
        }

        hooks::run_all(&flow::UPDATE_AFTER, self).await?;
        Ok(wrote)
    }

    /// Delete the row and freeze the instance. Reads keep working afterwards.
    pub async fn delete(&mut self, db: &Database) -> ModelResult<()> {
        if self.is_deleted() {
            return Err(ModelError::frozen(M::NAME));
        }
        if self.is_new {
            return Err(ModelError::unpersisted(M::NAME, "delete"));
        }

        let connection = db.connection_for(self.meta())?;
        hooks::run(HookPoint::BeforeDelete, self).await?;

        let meta = self.booted().meta().clone();
        let key = self.persisted_key("delete")?;
        let query = QueryBuilder::table(&meta.table)
            .date_columns(meta.dates.fields())
            .where_eq(&meta.primary_key, key)
            .delete();
        connection.execute(&query).await?;

        self.store.freeze();

        hooks::run(HookPoint::AfterDelete, self).await
    }

    /// Re-read the row, discarding unsaved changes
    pub async fn reload(&mut self, db: &Database) -> ModelResult<()> {
        if self.is_deleted() {
            return Err(ModelError::frozen(M::NAME));
        }
        if self.is_new {
            return Err(ModelError::unpersisted(M::NAME, "reload"));
        }

        let meta = self.booted().meta().clone();
        let key = self.persisted_key("reload")?;
        let connection = db.connection_for(&meta)?;
        let query = QueryBuilder::table(&meta.table)
            .date_columns(meta.dates.fields())
            .where_eq(&meta.primary_key, key.clone())
            .limit(1);

        let row = connection
            .fetch_optional(&query)
            .await?
            .ok_or_else(|| ModelError::not_found(M::NAME, format!("{} = {}", meta.primary_key, key)))?;

        self.store.reset_to(row);
        Ok(())
    }

    /// Primary key as last persisted; a changed key still targets the old row
    fn persisted_key(&self, operation: &str) -> ModelResult<Value> {
        self.store
            .original()
            .get(&self.meta().primary_key)
            .filter(|value| !value.is_null())
            .cloned()
            .ok_or_else(|| ModelError::unpersisted(M::NAME, operation))
    }
}
