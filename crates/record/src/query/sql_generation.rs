//! Query Builder SQL generation
//!
//! Placeholders are PostgreSQL-style `$n`, numbered in the order parameters
//! appear in the returned vector.

use super::builder::QueryBuilder;
use super::types::*;
use crate::value::Value;

impl QueryBuilder {
    /// Generate SQL with parameter placeholders and return the parameters
    pub fn to_sql_with_params(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        match self.query_type {
            QueryType::Select => self.build_select_sql(&mut sql, &mut params),
            QueryType::Insert => self.build_insert_sql(&mut sql, &mut params),
            QueryType::Update => self.build_update_sql(&mut sql, &mut params),
            QueryType::Delete => {
                sql.push_str(&format!("DELETE FROM {}", self.table));
                self.build_where_clause(&mut sql, &mut params);
            }
        }

        (sql, params)
    }

    /// SQL text only, for logging
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params().0
    }

    fn build_select_sql(&self, sql: &mut String, params: &mut Vec<Value>) {
        sql.push_str("SELECT ");
        if self.select_fields.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.select_fields.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        self.build_where_clause(sql, params);
        self.build_order_limit_clause(sql);
    }

    fn build_insert_sql(&self, sql: &mut String, params: &mut Vec<Value>) {
        sql.push_str(&format!("INSERT INTO {}", self.table));

        if self.set_clauses.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
            sql.push_str(" (");
            sql.push_str(&columns.join(", "));
            sql.push_str(") VALUES (");
            for (i, clause) in self.set_clauses.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                push_param(sql, params, &clause.value);
            }
            sql.push(')');
        }

        if let Some(column) = &self.returning {
            sql.push_str(&format!(" RETURNING {}", column));
        }
    }

    fn build_update_sql(&self, sql: &mut String, params: &mut Vec<Value>) {
        sql.push_str(&format!("UPDATE {} SET ", self.table));
        for (i, clause) in self.set_clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&clause.column);
            sql.push_str(" = ");
            push_param(sql, params, &clause.value);
        }

        self.build_where_clause(sql, params);
    }

    fn build_where_clause(&self, sql: &mut String, params: &mut Vec<Value>) {
        if self.where_conditions.is_empty() {
            return;
        }

        sql.push_str(" WHERE ");
        for (i, condition) in self.where_conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }

            sql.push_str(&condition.column);
            sql.push(' ');

            match condition.operator {
                QueryOperator::In | QueryOperator::NotIn => {
                    if condition.values.is_empty() {
                        // `IN ()` is invalid SQL; an empty set matches nothing
                        sql.truncate(sql.len() - condition.column.len() - 1);
                        sql.push_str(match condition.operator {
                            QueryOperator::In => "1 = 0",
                            _ => "1 = 1",
                        });
                        continue;
                    }
                    sql.push_str(&condition.operator.to_string());
                    sql.push_str(" (");
                    for (j, value) in condition.values.iter().enumerate() {
                        if j > 0 {
                            sql.push_str(", ");
                        }
                        push_param(sql, params, value);
                    }
                    sql.push(')');
                }
                QueryOperator::IsNull | QueryOperator::IsNotNull => {
                    sql.push_str(&condition.operator.to_string());
                }
                _ => {
                    sql.push_str(&condition.operator.to_string());
                    sql.push(' ');
                    match &condition.value {
                        Some(value) => push_param(sql, params, value),
                        None => sql.push_str("NULL"),
                    }
                }
            }
        }
    }

    fn build_order_limit_clause(&self, sql: &mut String) {
        if !self.order_by.is_empty() {
            let clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&clauses.join(", "));
        }

        if let Some(limit) = self.limit_count {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }
}

fn push_param(sql: &mut String, params: &mut Vec<Value>, value: &Value) {
    params.push(value.clone());
    sql.push_str(&format!("${}", params.len()));
}
