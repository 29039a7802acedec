//! # elif-record: Active Record model runtime for elif.rs
//!
//! Maps model instances to table rows and decides when to INSERT, UPDATE or
//! DELETE them:
//! - attribute storage with dirty tracking and freeze-on-delete
//! - per-field date formatting for storage and display
//! - static finders and a model-scoped query adapter
//! - has-one / has-many relationships, lazy or eager
//! - one-time boot per model type and ordered lifecycle hooks
//!
//! Statements run through a [`Connection`] picked by name from a
//! [`Database`] handle; PostgreSQL and in-memory connections are included.
//!
//! ```ignore
//! struct User;
//!
//! impl Model for User {
//!     const NAME: &'static str = "User";
//! }
//!
//! let user = User::create(&db, attrs! { "username" => "virk" }).await?;
//! let posts = user.has_many::<Post>().fetch(&db).await?;
//! ```

pub mod attributes;
pub mod config;
pub mod connection;
pub mod database;
pub mod dates;
pub mod error;
pub mod event_error;
pub mod events;
pub mod hooks;
pub mod model;
pub mod query;
pub mod registry;
pub mod relationships;
pub mod value;

// Re-export core traits and types
pub use attributes::{AttributeStore, Attributes};
pub use config::{ConfigError, ConnectionConfig, OrmConfig};
pub use connection::{
    Connection, ConnectionManager, ConnectionResolver, MemoryConnection, PostgresConnection, Row,
};
pub use database::Database;
pub use dates::{DateFormatter, DateNormalizer};
pub use error::{ModelError, ModelResult, OrmError, OrmResult};
pub use event_error::HookError;
pub use events::HookPoint;
pub use hooks::{FnHook, Hook, HookRegistry, ModelObserver};
pub use model::{Finders, Model, ModelDescriptor, ModelMeta, ModelQuery, Record};
pub use query::{OrderDirection, QueryBuilder, QueryOperator};
pub use relationships::{EagerLoad, HasMany, HasOne, RelationshipMeta, RelationshipType};
pub use value::Value;
