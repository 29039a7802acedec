//! Static finders and bulk creation, available on every model type
//!
//! Each finder issues exactly one query. Single-record finders run the
//! `after_find` hook on the record they return.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::attributes::Attributes;
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{Model, ModelQuery, Record};
use crate::registry;
use crate::value::Value;

#[async_trait]
pub trait Finders: Model {
    /// A query scoped to this model's table and connection
    fn query(db: &Database) -> ModelResult<ModelQuery<Self>> {
        ModelQuery::new(db)
    }

    /// Look up a row by primary key
    async fn find<K>(db: &Database, key: K) -> ModelResult<Option<Record<Self>>>
    where
        K: Into<Value> + Send,
    {
        let primary_key = primary_key::<Self>();
        Self::query(db)?.where_eq(&primary_key, key).first().await
    }

    async fn find_or_fail<K>(db: &Database, key: K) -> ModelResult<Record<Self>>
    where
        K: Into<Value> + Send,
    {
        let key = key.into();
        let primary_key = primary_key::<Self>();
        Self::query(db)?
            .where_eq(&primary_key, key.clone())
            .first()
            .await?
            .ok_or_else(|| ModelError::not_found(Self::NAME, format!("{} = {}", primary_key, key)))
    }

    /// First row whose `field` equals `value`
    async fn find_by<V>(db: &Database, field: &str, value: V) -> ModelResult<Option<Record<Self>>>
    where
        V: Into<Value> + Send,
    {
        Self::query(db)?.where_eq(field, value).first().await
    }

    async fn find_by_or_fail<V>(db: &Database, field: &str, value: V) -> ModelResult<Record<Self>>
    where
        V: Into<Value> + Send,
    {
        let value = value.into();
        Self::query(db)?
            .where_eq(field, value.clone())
            .first()
            .await?
            .ok_or_else(|| ModelError::not_found(Self::NAME, format!("{} = {}", field, value)))
    }

    /// Row with the lowest primary key
    async fn first(db: &Database) -> ModelResult<Option<Record<Self>>> {
        Self::query(db)?.order_by(&primary_key::<Self>()).first().await
    }

    async fn first_or_fail(db: &Database) -> ModelResult<Record<Self>> {
        Self::first(db)
            .await?
            .ok_or_else(|| ModelError::not_found(Self::NAME, "any row"))
    }

    /// Row with the highest primary key
    async fn last(db: &Database) -> ModelResult<Option<Record<Self>>> {
        Self::query(db)?.order_by_desc(&primary_key::<Self>()).first().await
    }

    async fn all(db: &Database) -> ModelResult<Vec<Record<Self>>> {
        Self::query(db)?.fetch().await
    }

    /// First `n` rows by ascending primary key. `n == 0` issues no query;
    /// `pick_one` is the single-row form.
    async fn pick(db: &Database, n: usize) -> ModelResult<Vec<Record<Self>>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        Self::query(db)?
            .order_by(&primary_key::<Self>())
            .limit(row_limit(n))
            .fetch()
            .await
    }

    /// Last `n` rows, highest primary key first. `n == 0` issues no query.
    async fn pick_inverse(db: &Database, n: usize) -> ModelResult<Vec<Record<Self>>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        Self::query(db)?
            .order_by_desc(&primary_key::<Self>())
            .limit(row_limit(n))
            .fetch()
            .await
    }

    /// `pick(db, 1)`
    async fn pick_one(db: &Database) -> ModelResult<Vec<Record<Self>>> {
        Self::pick(db, 1).await
    }

    /// `pick_inverse(db, 1)`
    async fn pick_inverse_one(db: &Database) -> ModelResult<Vec<Record<Self>>> {
        Self::pick_inverse(db, 1).await
    }

    /// Every primary-key value, ascending
    async fn ids(db: &Database) -> ModelResult<Vec<Value>> {
        Self::query(db)?.ids().await
    }

    /// Map of `lhs` to `rhs` across all rows; the last row wins on repeats
    async fn pair(db: &Database, lhs: &str, rhs: &str) -> ModelResult<IndexMap<String, Value>> {
        Self::query(db)?.pair(lhs, rhs).await
    }

    /// Build, fill and save a new record
    async fn create(db: &Database, attributes: Attributes) -> ModelResult<Record<Self>> {
        let mut record = Record::<Self>::from_attributes(attributes);
        record.save(db).await?;
        Ok(record)
    }

    /// One `create` per item, in order. Stops at the first failure; records
    /// already created stay created.
    async fn create_many(db: &Database, items: Vec<Attributes>) -> ModelResult<Vec<Record<Self>>> {
        let mut records = Vec::with_capacity(items.len());
        for attributes in items {
            records.push(Self::create(db, attributes).await?);
        }
        Ok(records)
    }

    /// First row matching `search`, or a new saved record built from
    /// `search` merged with `attributes`
    async fn find_or_create_by(
        db: &Database,
        search: Attributes,
        attributes: Attributes,
    ) -> ModelResult<Record<Self>> {
        if let Some(record) = Self::query(db)?.where_attributes(&search).first().await? {
            return Ok(record);
        }

        let mut payload = search;
        payload.extend(attributes);
        Self::create(db, payload).await
    }

    /// Like `find_or_create_by`, but the new record is left unsaved
    async fn find_or_new_by(
        db: &Database,
        search: Attributes,
        attributes: Attributes,
    ) -> ModelResult<Record<Self>> {
        if let Some(record) = Self::query(db)?.where_attributes(&search).first().await? {
            return Ok(record);
        }

        let mut payload = search;
        payload.extend(attributes);
        Ok(Record::from_attributes(payload))
    }

    /// Delete every row of the table, bypassing hooks
    async fn truncate(db: &Database) -> ModelResult<u64> {
        Self::query(db)?.delete().await
    }
}

impl<M: Model> Finders for M {}

/// Row count as a LIMIT, saturating instead of wrapping
fn row_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn primary_key<M: Model>() -> String {
    registry::boot::<M>().meta().primary_key.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_limit_saturates() {
        assert_eq!(row_limit(3), 3);
        assert_eq!(row_limit(usize::MAX), i64::MAX);
    }
}
