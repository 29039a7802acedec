//! Query Builder SELECT operations: projection, ordering and pagination

use super::builder::QueryBuilder;
use super::types::OrderDirection;

impl QueryBuilder {
    /// Add SELECT fields to the query
    pub fn select(mut self, fields: &str) -> Self {
        if fields.trim() == "*" {
            self.select_fields.clear();
        } else {
            self.select_fields.extend(
                fields
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty()),
            );
        }
        self
    }

    /// Add ORDER BY clause
    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Asc));
        self
    }

    /// Add ORDER BY DESC clause
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Desc));
        self
    }

    /// Add LIMIT clause
    pub fn limit(mut self, count: i64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, count: i64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// Paginate with 1-based page numbers
    pub fn for_page(self, page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        self.offset((page - 1) * per_page).limit(per_page)
    }
}
