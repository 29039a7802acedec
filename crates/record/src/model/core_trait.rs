//! Core Model Trait - the type-level half of a model
//!
//! A model type is usually a unit struct; its rows live in [`Record`]s.
//! Everything a model can customise is returned from `descriptor()`, and
//! `boot()` registers its hooks. Both run once per type, lazily.
//!
//! [`Record`]: crate::model::Record

use crate::hooks::HookRegistry;
use crate::model::descriptor::ModelDescriptor;

pub trait Model: Send + Sync + Sized + 'static {
    /// Type name, used for default table and foreign-key names and in errors
    const NAME: &'static str;

    /// Overridable configuration; defaults to all defaults
    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::new()
    }

    /// One-time initialisation. Must not touch records of its own type.
    fn boot(_hooks: &mut HookRegistry<Self>) {}
}
