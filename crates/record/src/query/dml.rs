//! Query Builder DML operations (INSERT, UPDATE, DELETE)
//!
//! `update` and `delete` keep the WHERE conditions already on the builder, so a
//! scoped select turns into a scoped bulk write.

use super::builder::QueryBuilder;
use super::types::*;
use crate::value::Value;

impl QueryBuilder {
    /// Start an INSERT query
    pub fn insert_into(table: &str) -> Self {
        let mut builder = Self::table(table);
        builder.query_type = QueryType::Insert;
        builder
    }

    /// Turn this builder into an UPDATE of its table
    pub fn update(mut self) -> Self {
        self.query_type = QueryType::Update;
        self.order_by.clear();
        self
    }

    /// Turn this builder into a DELETE from its table
    pub fn delete(mut self) -> Self {
        self.query_type = QueryType::Delete;
        self.order_by.clear();
        self
    }

    /// Set a column value (for INSERT/UPDATE)
    pub fn set<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set multiple values at once
    pub fn set_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.set_clauses
            .extend(values.into_iter().map(|(column, value)| SetClause { column, value }));
        self
    }

    /// Ask the INSERT to hand back `column` (the generated key)
    pub fn returning(mut self, column: &str) -> Self {
        self.returning = Some(column.to_string());
        self
    }
}
