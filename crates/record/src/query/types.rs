//! Query Builder Types - Core types and enums for query building

use std::fmt;

use crate::value::Value;

/// Query operator types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl QueryOperator {
    /// Parse an operator as written in SQL
    pub fn parse(operator: &str) -> Option<Self> {
        let op = match operator.trim().to_uppercase().as_str() {
            "=" => QueryOperator::Equal,
            "!=" | "<>" => QueryOperator::NotEqual,
            ">" => QueryOperator::GreaterThan,
            ">=" => QueryOperator::GreaterThanOrEqual,
            "<" => QueryOperator::LessThan,
            "<=" => QueryOperator::LessThanOrEqual,
            "LIKE" => QueryOperator::Like,
            "NOT LIKE" => QueryOperator::NotLike,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
            QueryOperator::In => write!(f, "IN"),
            QueryOperator::NotIn => write!(f, "NOT IN"),
            QueryOperator::IsNull => write!(f, "IS NULL"),
            QueryOperator::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// Where clause condition
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub column: String,
    pub operator: QueryOperator,
    pub value: Option<Value>,
    pub values: Vec<Value>, // For IN, NOT IN
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Query types supported by the builder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Set clause for UPDATE and INSERT operations
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: String,
    pub value: Value,
}
