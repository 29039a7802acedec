//! In-process connection
//!
//! Keeps tables as vectors of rows and interprets [`QueryBuilder`] statements
//! directly. Every executed statement is appended to a log, which makes "how
//! many queries did that issue" observable in tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use super::{Connection, Row};
use crate::error::{ModelError, ModelResult};
use crate::query::{OrderDirection, QueryBuilder, QueryOperator, QueryType, WhereCondition};
use crate::value::Value;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    log: Vec<String>,
    fail_next: Option<String>,
}

/// Connection backed by in-memory tables
#[derive(Debug, Default)]
pub struct MemoryConnection {
    state: Mutex<State>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert rows without logging a statement
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        let mut state = self.lock();
        state.tables.entry(table.to_string()).or_default().rows.extend(rows);
    }

    /// Current contents of `table`
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// SQL text of every statement executed so far
    pub fn statements(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn statement_count(&self) -> usize {
        self.lock().log.len()
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    /// Make the next statement fail with a storage error
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().fail_next = Some(message.into());
    }

    fn begin(&self, query: &QueryBuilder) -> ModelResult<MutexGuard<'_, State>> {
        let (sql, params) = query.to_sql_with_params();
        debug!(sql = %sql, params = params.len(), "executing statement");

        let mut state = self.lock();
        state.log.push(sql);
        if let Some(message) = state.fail_next.take() {
            return Err(ModelError::Storage(message));
        }
        Ok(state)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Row>> {
        if query.query_type() != QueryType::Select {
            return Err(ModelError::Query("fetch_all expects a SELECT".to_string()));
        }

        let state = self.begin(query)?;
        let mut rows: Vec<Row> = match state.tables.get(query.table_name()) {
            Some(table) => table
                .rows
                .iter()
                .filter(|row| matches_all(row, query.where_conditions()))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        drop(state);

        sort_rows(&mut rows, query.order_by_clauses());

        let offset = query.offset_value().unwrap_or(0).max(0) as usize;
        let limit = query.limit_count().map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        let rows = rows.into_iter().skip(offset).take(limit);

        let fields = query.select_fields();
        if fields.is_empty() {
            return Ok(rows.collect());
        }
        Ok(rows
            .map(|row| {
                fields
                    .iter()
                    .map(|f| (f.clone(), row.get(f).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect())
    }

    async fn insert(&self, query: &QueryBuilder) -> ModelResult<Option<Value>> {
        if query.query_type() != QueryType::Insert {
            return Err(ModelError::Query("insert expects an INSERT".to_string()));
        }

        let mut state = self.begin(query)?;
        let table = state.tables.entry(query.table_name().to_string()).or_default();

        let mut row: Row = query
            .set_clauses()
            .iter()
            .map(|clause| (clause.column.clone(), clause.value.clone()))
            .collect();

        let returned = match query.returning_column() {
            Some(column) => {
                let highest = table
                    .rows
                    .iter()
                    .filter_map(|r| r.get(column).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0);
                table.next_id = table.next_id.max(highest);

                let id = match row.get(column) {
                    Some(value) if !value.is_null() => value.clone(),
                    _ => {
                        table.next_id += 1;
                        let id = Value::Int(table.next_id);
                        row.insert(column.to_string(), id.clone());
                        id
                    }
                };
                Some(id)
            }
            None => None,
        };

        table.rows.push(row);
        Ok(returned)
    }

    async fn execute(&self, query: &QueryBuilder) -> ModelResult<u64> {
        match query.query_type() {
            QueryType::Update => {
                let mut state = self.begin(query)?;
                let Some(table) = state.tables.get_mut(query.table_name()) else {
                    return Ok(0);
                };

                let mut affected = 0;
                for row in table
                    .rows
                    .iter_mut()
                    .filter(|row| matches_all(row, query.where_conditions()))
                {
                    for clause in query.set_clauses() {
                        row.insert(clause.column.clone(), clause.value.clone());
                    }
                    affected += 1;
                }
                Ok(affected)
            }
            QueryType::Delete => {
                let mut state = self.begin(query)?;
                let Some(table) = state.tables.get_mut(query.table_name()) else {
                    return Ok(0);
                };

                let before = table.rows.len();
                table.rows.retain(|row| !matches_all(row, query.where_conditions()));
                Ok((before - table.rows.len()) as u64)
            }
            QueryType::Insert => self.insert(query).await.map(|_| 1),
            QueryType::Select => Err(ModelError::Query(
                "execute expects an UPDATE or DELETE".to_string(),
            )),
        }
    }
}

fn matches_all(row: &Row, conditions: &[WhereCondition]) -> bool {
    conditions.iter().all(|condition| matches(row, condition))
}

fn matches(row: &Row, condition: &WhereCondition) -> bool {
    let null = Value::Null;
    let actual = row.get(&condition.column).unwrap_or(&null);

    match condition.operator {
        QueryOperator::IsNull => actual.is_null(),
        QueryOperator::IsNotNull => !actual.is_null(),
        QueryOperator::In => !actual.is_null() && condition.values.iter().any(|v| v == actual),
        QueryOperator::NotIn => !actual.is_null() && !condition.values.iter().any(|v| v == actual),
        operator => {
            // SQL semantics: any comparison against NULL is unknown
            let expected = match &condition.value {
                Some(value) if !value.is_null() && !actual.is_null() => value,
                _ => return false,
            };
            match operator {
                QueryOperator::Equal => actual == expected,
                QueryOperator::NotEqual => actual != expected,
                QueryOperator::Like => like(actual, expected),
                QueryOperator::NotLike => !like(actual, expected),
                _ => {
                    let Some(ordering) = actual.compare(expected) else {
                        return false;
                    };
                    match operator {
                        QueryOperator::GreaterThan => ordering.is_gt(),
                        QueryOperator::GreaterThanOrEqual => ordering.is_ge(),
                        QueryOperator::LessThan => ordering.is_lt(),
                        QueryOperator::LessThanOrEqual => ordering.is_le(),
                        _ => false,
                    }
                }
            }
        }
    }
}

fn like(actual: &Value, pattern: &Value) -> bool {
    let text: Vec<char> = actual.to_string().chars().collect();
    let pattern: Vec<char> = pattern.to_string().chars().collect();
    like_match(&text, &pattern)
}

// `%` matches any run of characters, `_` exactly one
fn like_match(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|i| like_match(&text[i..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_match(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_match(&text[1..], rest),
    }
}

fn sort_rows(rows: &mut [Row], order_by: &[(String, OrderDirection)]) {
    if order_by.is_empty() {
        return;
    }

    let null = Value::Null;
    rows.sort_by(|a, b| {
        for (column, direction) in order_by {
            let left = a.get(column).unwrap_or(&null);
            let right = b.get(column).unwrap_or(&null);
            let ordering = left.compare(right).unwrap_or(std::cmp::Ordering::Equal);
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering.is_ne() {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}
