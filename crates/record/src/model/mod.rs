//! Model runtime - model types, instances and their persistence
//!
//! This module is organized into focused submodules:
//! - `core_trait`: the `Model` trait implemented by each model type
//! - `descriptor`: overridable model configuration and its resolved form
//! - `record`: model instances with attribute and state tracking
//! - `persistence`: save / delete / reload
//! - `finders`: static lookup and bulk-create operations
//! - `query`: model-scoped query adapter

pub mod core_trait;
pub mod descriptor;
pub mod finders;
pub mod persistence;
pub mod query;
pub mod record;

pub use core_trait::Model;
pub use descriptor::{table_name_for, AttributeMutator, ModelDescriptor, ModelMeta};
pub use finders::Finders;
pub use query::ModelQuery;
pub use record::Record;
