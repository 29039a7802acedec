//! Relationship Resolver - has-one and has-many associations
//!
//! A relationship is metadata bound to a parent record: nothing is queried
//! until `fetch` is called, and nothing is cached on the parent. Each `fetch`
//! re-queries the related table filtered by `foreign_key = parent.local_key`.
//! [`EagerLoad`] resolves one relation for many parents with a single query.

pub mod eager;
pub mod has_many;
pub mod has_one;

pub use eager::EagerLoad;
pub use has_many::HasMany;
pub use has_one::HasOne;

use crate::error::{ModelError, ModelResult};
use crate::model::{Model, Record};
use crate::registry;
use crate::value::Value;

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    HasOne,
    HasMany,
}

/// Relationship metadata
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMeta {
    pub kind: RelationshipType,
    /// Column on the related table referencing the parent
    pub foreign_key: String,
    /// Column on the parent table being referenced
    pub local_key: String,
    pub related_table: String,
}

impl RelationshipMeta {
    /// Conventional metadata: `<parent>_id` on the related table, referencing
    /// the parent's primary key
    pub fn infer<P: Model, R: Model>(kind: RelationshipType) -> Self {
        let parent = registry::boot::<P>();
        let related = registry::boot::<R>();
        Self {
            kind,
            foreign_key: parent.meta().foreign_key_name(),
            local_key: parent.meta().primary_key.clone(),
            related_table: related.meta().table.clone(),
        }
    }
}

/// Value of the parent's local key; the parent must be persisted
pub(crate) fn parent_key<P: Model>(parent: &Record<P>, meta: &RelationshipMeta) -> ModelResult<Value> {
    if parent.is_new() {
        return Err(ModelError::unpersisted(P::NAME, "load a relationship of"));
    }
    parent
        .raw(&meta.local_key)
        .filter(|value| !value.is_null())
        .cloned()
        .ok_or_else(|| ModelError::unpersisted(P::NAME, "load a relationship of"))
}
