use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::{Connection, ConnectionResolver, PostgresConnection};
use crate::config::OrmConfig;
use crate::error::{ModelError, ModelResult};

/// Registry of named connections
#[derive(Default)]
pub struct ConnectionManager {
    connections: DashMap<String, Arc<dyn Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a PostgreSQL pool for every profile in `config`
    pub async fn from_config(config: &OrmConfig) -> ModelResult<Self> {
        config.validate()?;

        let manager = Self::new();
        for (name, connection) in &config.connections {
            let pool = PostgresConnection::connect(connection).await?;
            manager.register(name.clone(), Arc::new(pool));
        }
        Ok(manager)
    }

    /// Register (or replace) the connection called `name`
    pub fn register(&self, name: impl Into<String>, connection: Arc<dyn Connection>) {
        let name = name.into();
        debug!(connection = %name, "registered connection");
        self.connections.insert(name, connection);
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn Connection>> {
        self.connections.remove(name).map(|(_, connection)| connection)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl ConnectionResolver for ConnectionManager {
    fn resolve(&self, name: &str) -> ModelResult<Arc<dyn Connection>> {
        self.connections
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ModelError::Connection(format!("Connection '{}' is not registered", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::MemoryConnection;

    #[test]
    fn test_resolve_registered_and_missing() {
        let manager = ConnectionManager::new();
        manager.register("default", Arc::new(MemoryConnection::new()));
        manager.register("analytics", Arc::new(MemoryConnection::new()));

        assert!(manager.resolve("default").is_ok());
        assert_eq!(manager.names(), vec!["analytics", "default"]);

        let err = manager.resolve("mysql").err().unwrap();
        assert!(matches!(err, ModelError::Connection(_)));
        assert!(err.to_string().contains("mysql"));
    }

    #[test]
    fn test_remove() {
        let manager = ConnectionManager::new();
        manager.register("default", Arc::new(MemoryConnection::new()));
        assert!(manager.remove("default").is_some());
        assert!(!manager.contains("default"));
    }
}
