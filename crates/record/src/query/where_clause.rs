//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::{ModelError, ModelResult};
use crate::value::Value;

impl QueryBuilder {
    fn push_condition(mut self, column: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator,
            value,
            values: Vec::new(),
        });
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::Equal, Some(value.into()))
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::NotEqual, Some(value.into()))
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThan, Some(value.into()))
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::GreaterThanOrEqual, Some(value.into()))
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThan, Some(value.into()))
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.push_condition(column, QueryOperator::LessThanOrEqual, Some(value.into()))
    }

    /// Add WHERE condition with LIKE (`%` and `_` wildcards)
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::Like, Some(Value::from(pattern)))
    }

    /// Add WHERE condition with NOT LIKE
    pub fn where_not_like(self, column: &str, pattern: &str) -> Self {
        self.push_condition(column, QueryOperator::NotLike, Some(Value::from(pattern)))
    }

    /// Add WHERE condition with an operator given as SQL text
    pub fn where_condition<T: Into<Value>>(
        self,
        column: &str,
        operator: &str,
        value: T,
    ) -> ModelResult<Self> {
        let operator = QueryOperator::parse(operator)
            .ok_or_else(|| ModelError::Query(format!("Unsupported operator '{}'", operator)))?;
        Ok(self.push_condition(column, operator, Some(value.into())))
    }

    /// Add WHERE IN condition
    pub fn where_in<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator: QueryOperator::In,
            value: None,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add WHERE NOT IN condition
    pub fn where_not_in<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.where_conditions.push(WhereCondition {
            column: column.to_string(),
            operator: QueryOperator::NotIn,
            value: None,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add WHERE IS NULL condition
    pub fn where_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNull, None)
    }

    /// Add WHERE IS NOT NULL condition
    pub fn where_not_null(self, column: &str) -> Self {
        self.push_condition(column, QueryOperator::IsNotNull, None)
    }
}
