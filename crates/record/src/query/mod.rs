//! Query Builder Module - fluent builder handed to connections for execution
//!
//! The builder only describes a statement; connections decide how to run it.
//! SQL connections compile it with `to_sql_with_params`, the in-memory
//! connection interprets it directly.

pub mod builder;
pub mod dml;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{OrderDirection, QueryOperator, QueryType, SetClause, WhereCondition};
