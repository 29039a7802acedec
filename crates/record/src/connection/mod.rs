//! Connections - the seam between models and storage
//!
//! A [`Connection`] executes [`QueryBuilder`] statements and hands rows back as
//! ordered field/value maps. A [`ConnectionResolver`] maps a connection name
//! to a connection; models only ever name the connection they want.

pub mod memory;
pub mod postgres;
pub mod resolver;

use std::sync::Arc;

use async_trait::async_trait;

use crate::attributes::Attributes;
use crate::error::ModelResult;
use crate::query::QueryBuilder;
use crate::value::Value;

pub use memory::MemoryConnection;
pub use postgres::PostgresConnection;
pub use resolver::ConnectionManager;

/// A row as returned by a connection
pub type Row = Attributes;

/// Executes built statements against one storage backend
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a SELECT and return every matching row
    async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Row>>;

    /// Run an INSERT; returns the `RETURNING` column's value when one was requested
    async fn insert(&self, query: &QueryBuilder) -> ModelResult<Option<Value>>;

    /// Run an UPDATE or DELETE and return the number of affected rows
    async fn execute(&self, query: &QueryBuilder) -> ModelResult<u64>;

    /// Run a SELECT and return the first row, if any
    async fn fetch_optional(&self, query: &QueryBuilder) -> ModelResult<Option<Row>> {
        Ok(self.fetch_all(query).await?.into_iter().next())
    }
}

/// Resolves connection names to connections
pub trait ConnectionResolver: Send + Sync {
    fn resolve(&self, name: &str) -> ModelResult<Arc<dyn Connection>>;
}
