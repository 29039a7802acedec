//! Model Type descriptor
//!
//! A model type describes itself with a [`ModelDescriptor`]: every option is
//! optional and falls back to a documented default when the descriptor is
//! resolved into [`ModelMeta`] at boot.
//!
//! | option        | default                                   |
//! |---------------|-------------------------------------------|
//! | table         | snake_case plural of the type name        |
//! | connection    | the `Database` handle's default           |
//! | primary key   | `id`                                      |
//! | incrementing  | `true`                                    |
//! | created at    | `created_at`                              |
//! | updated at    | `updated_at`                              |
//! | dates         | the two timestamp columns                 |
//! | date format   | `%Y-%m-%d %H:%M:%S`                       |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dates::{DateFormatter, DateNormalizer};
use crate::value::Value;

/// Per-field value transform used by setters and getters
pub type AttributeMutator = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Overridable configuration of a model type
#[derive(Clone, Default)]
pub struct ModelDescriptor {
    table: Option<String>,
    connection: Option<String>,
    primary_key: Option<String>,
    incrementing: Option<bool>,
    dates: Vec<String>,
    created_at: Option<Option<String>>,
    updated_at: Option<Option<String>>,
    date_format: Option<String>,
    storage_formatters: Vec<(String, DateFormatter)>,
    display_casts: Vec<(String, DateFormatter)>,
    setters: HashMap<String, AttributeMutator>,
    getters: HashMap<String, AttributeMutator>,
    hidden: Vec<String>,
    visible: Option<Vec<String>>,
}

impl ModelDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Named connection profile; unset means the handle's default
    pub fn connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = Some(primary_key.into());
        self
    }

    /// Whether storage generates the primary key on insert
    pub fn incrementing(mut self, incrementing: bool) -> Self {
        self.incrementing = Some(incrementing);
        self
    }

    /// Declare an extra date field
    pub fn date(mut self, field: impl Into<String>) -> Self {
        self.dates.push(field.into());
        self
    }

    /// Rename the "created at" column, or disable it with `None`
    pub fn created_at_column(mut self, column: Option<&str>) -> Self {
        self.created_at = Some(column.map(str::to_string));
        self
    }

    /// Rename the "updated at" column, or disable it with `None`
    pub fn updated_at_column(mut self, column: Option<&str>) -> Self {
        self.updated_at = Some(column.map(str::to_string));
        self
    }

    /// Default storage format for every date field without its own formatter
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Override how `field` is formatted right before a write
    pub fn format_date_for_storage<F>(mut self, field: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.storage_formatters.push((field.into(), Arc::new(formatter)));
        self
    }

    /// Override how a persisted `field` is rendered by `to_json`
    pub fn cast_date<F>(mut self, field: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.display_casts.push((field.into(), Arc::new(formatter)));
        self
    }

    /// Transform values assigned to `field`
    pub fn setter<F>(mut self, field: impl Into<String>, setter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.setters.insert(field.into(), Arc::new(setter));
        self
    }

    /// Transform values read from `field`
    pub fn getter<F>(mut self, field: impl Into<String>, getter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.getters.insert(field.into(), Arc::new(getter));
        self
    }

    /// Fields left out of `to_json`
    pub fn hidden<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden.extend(fields.into_iter().map(Into::into));
        self
    }

    /// When set, the only fields `to_json` emits
    pub fn visible<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visible = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Apply defaults for everything left unset
    pub fn resolve(self, name: &'static str) -> ModelMeta {
        let created_at = self.created_at.unwrap_or_else(|| Some("created_at".to_string()));
        let updated_at = self.updated_at.unwrap_or_else(|| Some("updated_at".to_string()));

        let mut dates = DateNormalizer::new();
        if let Some(format) = self.date_format {
            dates.set_format(format);
        }
        for field in created_at.iter().chain(updated_at.iter()) {
            dates.add_field(field.clone());
        }
        for field in self.dates {
            dates.add_field(field);
        }
        for (field, formatter) in self.storage_formatters {
            dates.override_storage(field, formatter);
        }
        for (field, formatter) in self.display_casts {
            dates.override_display(field, formatter);
        }

        ModelMeta {
            name,
            table: self.table.unwrap_or_else(|| table_name_for(name)),
            connection: self.connection,
            primary_key: self.primary_key.unwrap_or_else(|| "id".to_string()),
            incrementing: self.incrementing.unwrap_or(true),
            created_at,
            updated_at,
            dates,
            setters: self.setters,
            getters: self.getters,
            hidden: self.hidden,
            visible: self.visible,
        }
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("table", &self.table)
            .field("connection", &self.connection)
            .field("primary_key", &self.primary_key)
            .field("dates", &self.dates)
            .finish_non_exhaustive()
    }
}

/// Resolved, immutable metadata of a booted model type
#[derive(Clone)]
pub struct ModelMeta {
    pub name: &'static str,
    pub table: String,
    pub connection: Option<String>,
    pub primary_key: String,
    pub incrementing: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub dates: DateNormalizer,
    pub hidden: Vec<String>,
    pub visible: Option<Vec<String>>,
    setters: HashMap<String, AttributeMutator>,
    getters: HashMap<String, AttributeMutator>,
}

impl ModelMeta {
    /// Foreign-key column other tables use to reference this type
    pub fn foreign_key_name(&self) -> String {
        format!("{}_id", snake_case(self.name))
    }

    pub fn apply_setter(&self, field: &str, value: Value) -> Value {
        match self.setters.get(field) {
            Some(setter) => setter(value),
            None => value,
        }
    }

    pub fn apply_getter(&self, field: &str, value: Value) -> Value {
        match self.getters.get(field) {
            Some(getter) => getter(value),
            None => value,
        }
    }

    /// Whether `field` appears in serialized output
    pub fn is_serialized(&self, field: &str) -> bool {
        if let Some(visible) = &self.visible {
            return visible.iter().any(|f| f == field);
        }
        !self.hidden.iter().any(|f| f == field)
    }
}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMeta")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("connection", &self.connection)
            .field("primary_key", &self.primary_key)
            .field("incrementing", &self.incrementing)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("dates", &self.dates)
            .finish_non_exhaustive()
    }
}

/// `BlogPost` -> `blog_post`
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// English plural of a snake_case word
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if before.map_or(false, |c| !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Default table name for a model type name
pub fn table_name_for(name: &str) -> String {
    pluralize(&snake_case(name))
}
