//! Query Builder - Core builder implementation

use super::types::*;

/// Query builder for constructing database queries against one table
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    pub(crate) table: String,
    pub(crate) query_type: QueryType,
    pub(crate) select_fields: Vec<String>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) returning: Option<String>,
    pub(crate) date_columns: Vec<String>,
}

impl QueryBuilder {
    /// Create a SELECT builder for `table`
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            query_type: QueryType::Select,
            select_fields: Vec::new(),
            set_clauses: Vec::new(),
            where_conditions: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            returning: None,
            date_columns: Vec::new(),
        }
    }

    /// Declare which columns hold dates. Connections with typed parameters
    /// bind date strings in these columns as timestamps and every other
    /// string as text.
    pub fn date_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    pub fn set_clauses(&self) -> &[SetClause] {
        &self.set_clauses
    }

    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }

    pub fn order_by_clauses(&self) -> &[(String, OrderDirection)] {
        &self.order_by
    }

    pub fn limit_count(&self) -> Option<i64> {
        self.limit_count
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset_value
    }

    pub fn returning_column(&self) -> Option<&str> {
        self.returning.as_deref()
    }

    pub fn date_column_names(&self) -> &[String] {
        &self.date_columns
    }

    pub fn is_date_column(&self, column: &str) -> bool {
        self.date_columns.iter().any(|c| c == column)
    }
}
