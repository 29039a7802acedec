//! Database handle
//!
//! Bundles a connection resolver with the name of the default connection.
//! Every model operation takes a `&Database`; models that do not name a
//! connection in their descriptor run on the default one.

use std::sync::Arc;

use crate::config::OrmConfig;
use crate::connection::{Connection, ConnectionManager, ConnectionResolver};
use crate::error::ModelResult;
use crate::model::ModelMeta;

#[derive(Clone)]
pub struct Database {
    resolver: Arc<dyn ConnectionResolver>,
    default_connection: String,
}

impl Database {
    pub fn new(resolver: Arc<dyn ConnectionResolver>, default_connection: impl Into<String>) -> Self {
        Self {
            resolver,
            default_connection: default_connection.into(),
        }
    }

    /// A handle with a single connection registered as `name`, which is also the default
    pub fn with_connection(name: impl Into<String>, connection: Arc<dyn Connection>) -> Self {
        let name = name.into();
        let manager = ConnectionManager::new();
        manager.register(name.clone(), connection);
        Self::new(Arc::new(manager), name)
    }

    /// Open every configured connection
    pub async fn from_config(config: &OrmConfig) -> ModelResult<Self> {
        let manager = ConnectionManager::from_config(config).await?;
        Ok(Self::new(Arc::new(manager), config.default_connection.clone()))
    }

    pub fn default_connection(&self) -> &str {
        &self.default_connection
    }

    /// Resolve a named connection, or the default one
    pub fn connection(&self, name: Option<&str>) -> ModelResult<Arc<dyn Connection>> {
        self.resolver.resolve(name.unwrap_or(&self.default_connection))
    }

    pub(crate) fn connection_for(&self, meta: &ModelMeta) -> ModelResult<Arc<dyn Connection>> {
        self.connection(meta.connection.as_deref())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("default_connection", &self.default_connection)
            .finish_non_exhaustive()
    }
}
