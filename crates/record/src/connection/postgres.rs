//! PostgreSQL connection over a sqlx pool

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::debug;

use super::{Connection, Row};
use crate::config::ConnectionConfig;
use crate::error::{ModelError, ModelResult};
use crate::query::{QueryBuilder, QueryType};
use crate::value::{parse_date, Value};

/// Connection backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresConnection {
    pool: PgPool,
}

impl PostgresConnection {
    /// Open a pool using the profile's settings
    pub async fn connect(config: &ConnectionConfig) -> ModelResult<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));

        if let Some(idle) = config.idle_timeout_seconds {
            options = options.idle_timeout(Duration::from_secs(idle));
        }
        if let Some(lifetime) = config.max_lifetime_seconds {
            options = options.max_lifetime(Duration::from_secs(lifetime));
        }

        let pool = options
            .connect(&config.url)
            .await
            .map_err(|e| ModelError::Connection(format!("Failed to connect: {}", e)))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn prepare<'q>(sql: &'q str, params: &[Value]) -> Query<'q, Postgres, PgArguments> {
        params.iter().fold(sqlx::query(sql), bind_value)
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Row>> {
        let (sql, params) = typed_dates(query).to_sql_with_params();
        debug!(sql = %sql, params = params.len(), "executing statement");

        let rows = Self::prepare(&sql, &params).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_attributes).collect()
    }

    async fn insert(&self, query: &QueryBuilder) -> ModelResult<Option<Value>> {
        if query.query_type() != QueryType::Insert {
            return Err(ModelError::Query("insert expects an INSERT".to_string()));
        }

        let (sql, params) = typed_dates(query).to_sql_with_params();
        debug!(sql = %sql, params = params.len(), "executing statement");

        let prepared = Self::prepare(&sql, &params);
        match query.returning_column() {
            Some(column) => {
                let row = prepared.fetch_one(&self.pool).await?;
                let attributes = row_to_attributes(&row)?;
                Ok(attributes.get(column).cloned())
            }
            None => {
                prepared.execute(&self.pool).await?;
                Ok(None)
            }
        }
    }

    async fn execute(&self, query: &QueryBuilder) -> ModelResult<u64> {
        let (sql, params) = typed_dates(query).to_sql_with_params();
        debug!(sql = %sql, params = params.len(), "executing statement");

        let result = Self::prepare(&sql, &params).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Copy of `query` where date strings in its declared date columns become
/// timestamps. Strings anywhere else are left alone and bind as text.
fn typed_dates(query: &QueryBuilder) -> QueryBuilder {
    let mut typed = query.clone();
    if typed.date_columns.is_empty() {
        return typed;
    }

    let date_columns = typed.date_columns.clone();
    let is_date = |column: &str| date_columns.iter().any(|c| c == column);

    for clause in typed.set_clauses.iter_mut().filter(|c| is_date(&c.column)) {
        as_timestamp(&mut clause.value);
    }
    for condition in typed.where_conditions.iter_mut().filter(|c| is_date(&c.column)) {
        if let Some(value) = condition.value.as_mut() {
            as_timestamp(value);
        }
        condition.values.iter_mut().for_each(as_timestamp);
    }
    typed
}

fn as_timestamp(value: &mut Value) {
    if let Value::String(s) = value {
        if let Some(date) = parse_date(s) {
            *value = Value::Date(date);
        }
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.clone()),
        Value::Date(d) => query.bind(*d),
        Value::Json(j) => query.bind(j.clone()),
    }
}

fn row_to_attributes(row: &PgRow) -> ModelResult<Row> {
    let mut attributes = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        attributes.insert(column.name().to_string(), column_value(row, index)?);
    }
    Ok(attributes)
}

fn column_value(row: &PgRow, index: usize) -> ModelResult<Value> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get(index)?),
        "INT2" => Value::Int(row.try_get::<i16, _>(index)? as i64),
        "INT4" => Value::Int(row.try_get::<i32, _>(index)? as i64),
        "INT8" => Value::Int(row.try_get(index)?),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(index)? as f64),
        "FLOAT8" => Value::Float(row.try_get(index)?),
        "TIMESTAMP" => Value::Date(row.try_get(index)?),
        "TIMESTAMPTZ" => Value::from(row.try_get::<chrono::DateTime<chrono::Utc>, _>(index)?),
        "JSON" | "JSONB" => Value::from_json(row.try_get(index)?),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => Value::String(row.try_get(index)?),
        other => {
            return Err(ModelError::Serialization(format!(
                "Unsupported column type '{}'",
                other
            )))
        }
    };
    Ok(value)
}
