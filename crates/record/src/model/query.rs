//! Query Adapter - a query builder scoped to one model type
//!
//! `ModelQuery<M>` pins the builder to `M`'s table and the connection `M`
//! runs on, and turns result rows into `Record<M>`s. Its bulk `update` and
//! `delete` go straight to the connection: no instance is loaded and no hook
//! runs.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::attributes::Attributes;
use crate::connection::Connection;
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::events::HookPoint;
use crate::hooks;
use crate::model::{Model, Record};
use crate::query::QueryBuilder;
use crate::registry::{self, BootedModel};
use crate::value::Value;

pub struct ModelQuery<M: Model> {
    model: Arc<BootedModel<M>>,
    connection: Arc<dyn Connection>,
    builder: QueryBuilder,
}

impl<M: Model> ModelQuery<M> {
    /// A SELECT on `M`'s table, bound to `M`'s connection
    pub fn new(db: &Database) -> ModelResult<Self> {
        let model = registry::boot::<M>();
        let connection = db.connection_for(model.meta())?;
        let builder = QueryBuilder::table(&model.meta().table)
            .date_columns(model.meta().dates.fields());
        Ok(Self {
            model,
            connection,
            builder,
        })
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Apply arbitrary builder calls
    pub fn scope<F>(mut self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder,
    {
        self.builder = f(self.builder);
        self
    }

    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.scope(|b| b.where_eq(column, value))
    }

    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.scope(|b| b.where_ne(column, value))
    }

    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.scope(|b| b.where_gt(column, value))
    }

    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.scope(|b| b.where_gte(column, value))
    }

    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.scope(|b| b.where_lt(column, value))
    }

    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.scope(|b| b.where_lte(column, value))
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.scope(|b| b.where_like(column, pattern))
    }

    pub fn where_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.scope(|b| b.where_in(column, values))
    }

    pub fn where_not_in<I, T>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.scope(|b| b.where_not_in(column, values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.scope(|b| b.where_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.scope(|b| b.where_not_null(column))
    }

    /// Match every field/value pair in `attributes`
    pub fn where_attributes(self, attributes: &Attributes) -> Self {
        self.scope(|b| {
            attributes
                .iter()
                .fold(b, |b, (field, value)| b.where_eq(field, value.clone()))
        })
    }

    pub fn order_by(self, column: &str) -> Self {
        self.scope(|b| b.order_by(column))
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.scope(|b| b.order_by_desc(column))
    }

    pub fn limit(self, count: i64) -> Self {
        self.scope(|b| b.limit(count))
    }

    pub fn offset(self, count: i64) -> Self {
        self.scope(|b| b.offset(count))
    }

    pub fn for_page(self, page: i64, per_page: i64) -> Self {
        self.scope(|b| b.for_page(page, per_page))
    }

    /// Every matching row as a record
    pub async fn fetch(self) -> ModelResult<Vec<Record<M>>> {
        let rows = self.connection.fetch_all(&self.builder).await?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(self.model.clone(), row))
            .collect())
    }

    /// The first matching row; runs `after_find` on it
    pub async fn first(self) -> ModelResult<Option<Record<M>>> {
        let query = self.builder.limit(1);
        let row = self.connection.fetch_optional(&query).await?;

        match row {
            Some(row) => {
                let mut record = Record::from_row(self.model, row);
                hooks::run(HookPoint::AfterFind, &mut record).await?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub async fn first_or_fail(self) -> ModelResult<Record<M>> {
        let criteria = describe(&self.builder);
        self.first()
            .await?
            .ok_or_else(|| ModelError::not_found(M::NAME, criteria))
    }

    /// Primary-key values of every matching row, ascending unless ordered
    pub async fn ids(self) -> ModelResult<Vec<Value>> {
        let primary_key = self.model.meta().primary_key.clone();
        let mut query = self.builder.select(&primary_key);
        if query.order_by_clauses().is_empty() {
            query = query.order_by(&primary_key);
        }

        let rows = self.connection.fetch_all(&query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.shift_remove(&primary_key))
            .collect())
    }

    /// Map of `lhs` to `rhs` across matching rows. Rows are read in
    /// primary-key order, so on a repeated `lhs` value the last row wins.
    pub async fn pair(self, lhs: &str, rhs: &str) -> ModelResult<IndexMap<String, Value>> {
        let primary_key = self.model.meta().primary_key.clone();
        let mut query = self.builder;
        if query.order_by_clauses().is_empty() {
            query = query.order_by(&primary_key);
        }

        let rows = self.connection.fetch_all(&query).await?;
        let mut pairs = IndexMap::new();
        for row in rows {
            let key = row.get(lhs).cloned().unwrap_or_default().to_string();
            let value = row.get(rhs).cloned().unwrap_or_default();
            pairs.insert(key, value);
        }
        Ok(pairs)
    }

    /// Bulk UPDATE of every matching row. No hooks run and no timestamps are
    /// touched; date fields are still formatted for storage.
    pub async fn update(self, mut attributes: Attributes) -> ModelResult<u64> {
        self.model.meta().dates.normalize_for_storage(&mut attributes);
        let query = self.builder.update().set_values(attributes);
        self.connection.execute(&query).await
    }

    /// Bulk DELETE of every matching row. No hooks run.
    pub async fn delete(self) -> ModelResult<u64> {
        let query = self.builder.delete();
        self.connection.execute(&query).await
    }
}

/// Human-readable rendering of a builder's WHERE conditions
fn describe(builder: &QueryBuilder) -> String {
    let conditions: Vec<String> = builder
        .where_conditions()
        .iter()
        .map(|c| match &c.value {
            Some(value) => format!("{} {} {}", c.column, c.operator, value),
            None if c.values.is_empty() => format!("{} {}", c.column, c.operator),
            None => {
                let values: Vec<String> = c.values.iter().map(Value::to_string).collect();
                format!("{} {} ({})", c.column, c.operator, values.join(", "))
            }
        })
        .collect();

    if conditions.is_empty() {
        "any row".to_string()
    } else {
        conditions.join(" AND ")
    }
}
