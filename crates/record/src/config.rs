//! Connection configuration
//!
//! Named connection profiles with pool settings. Loaded from the environment
//! (`DB_CONNECTION`, `DATABASE_URL`, `DB_MAX_CONNECTIONS`) or from JSON.

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

/// One named connection profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: Option<u64>,
    pub max_lifetime_seconds: Option<u64>,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),  // 10 minutes
            max_lifetime_seconds: Some(1800), // 30 minutes
        }
    }
}

/// Every connection profile plus the name of the default one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrmConfig {
    #[serde(default = "default_connection_name")]
    pub default_connection: String,
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

fn default_connection_name() -> String {
    "default".to_string()
}

impl Default for OrmConfig {
    fn default() -> Self {
        Self {
            default_connection: default_connection_name(),
            connections: HashMap::new(),
        }
    }
}

impl OrmConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup("DB_CONNECTION").unwrap_or_else(default_connection_name);

        let url = lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingRequired {
            field: "DATABASE_URL".to_string(),
            hint: "Set DATABASE_URL to a postgres:// connection string".to_string(),
        })?;

        let mut connection = ConnectionConfig::new(url);
        if let Some(max) = lookup("DB_MAX_CONNECTIONS") {
            connection.max_connections = max.parse().map_err(|_| ConfigError::InvalidValue {
                field: "DB_MAX_CONNECTIONS".to_string(),
                value: max.clone(),
                expected: "a positive integer".to_string(),
            })?;
        }

        let config = Self {
            default_connection: name.clone(),
            connections: HashMap::from([(name, connection)]),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Add or replace a profile
    pub fn with_connection(mut self, name: impl Into<String>, connection: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), connection);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.connections.contains_key(&self.default_connection) {
            return Err(ConfigError::MissingRequired {
                field: format!("connections.{}", self.default_connection),
                hint: "The default connection must be declared".to_string(),
            });
        }

        for (name, connection) in &self.connections {
            if connection.url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("connections.{}.url", name),
                    value: connection.url.clone(),
                    expected: "a non-empty connection URL".to_string(),
                });
            }
            if connection.max_connections == 0 || connection.min_connections > connection.max_connections {
                return Err(ConfigError::InvalidValue {
                    field: format!("connections.{}.max_connections", name),
                    value: connection.max_connections.to_string(),
                    expected: "at least 1 and not below min_connections".to_string(),
                });
            }
        }

        Ok(())
    }
}
