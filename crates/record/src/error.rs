//! Error types for the model runtime
//!
//! Every failure surfaces to the caller of the triggering operation (`save`,
//! `delete`, a finder, a relationship resolution). Nothing here is retried or
//! swallowed.

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for model operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// A finder or relationship demanded a row that does not exist
    #[error("No {model} found for {criteria}")]
    NotFound { model: String, criteria: String },

    /// A write was attempted on an instance after it was deleted
    #[error("Cannot modify a deleted {model} instance")]
    FrozenInstance { model: String },

    /// An operation needs a persisted row but the instance was never inserted
    #[error("Cannot {operation} a {model} instance that has not been persisted")]
    UnpersistedInstance { model: String, operation: String },

    /// A lifecycle hook rejected the operation
    #[error("{hook} hook aborted the operation: {reason}")]
    HookAborted { hook: String, reason: String },

    /// Opaque failure reported by the query/connection layer
    #[error("Storage error: {0}")]
    Storage(String),

    /// Connection could not be resolved or established
    #[error("Connection error: {0}")]
    Connection(String),

    /// Value conversion failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The query could not be built
    #[error("Query error: {0}")]
    Query(String),
}

impl ModelError {
    pub fn not_found(model: &str, criteria: impl Into<String>) -> Self {
        ModelError::NotFound {
            model: model.to_string(),
            criteria: criteria.into(),
        }
    }

    pub fn frozen(model: &str) -> Self {
        ModelError::FrozenInstance {
            model: model.to_string(),
        }
    }

    pub fn unpersisted(model: &str, operation: &str) -> Self {
        ModelError::UnpersistedInstance {
            model: model.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, ModelError::FrozenInstance { .. })
    }

    pub fn is_unpersisted(&self) -> bool {
        matches!(self, ModelError::UnpersistedInstance { .. })
    }

    pub fn is_hook_aborted(&self) -> bool {
        matches!(self, ModelError::HookAborted { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, ModelError::Storage(_))
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Storage(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
