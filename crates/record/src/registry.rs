//! Boot manager
//!
//! Each model type boots once, lazily, the first time anything touches it:
//! its descriptor is resolved into [`ModelMeta`] and its `boot` body registers
//! hooks. The per-type latch is a `OnceCell`, so concurrent first callers
//! block until the single boot body finishes and then all observe its result.
//! The map lock is released before the boot body runs.

use std::any::{Any, TypeId};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::events::HookPoint;
use crate::event_error::HookError;
use crate::hooks::{Hook, HookRegistry, ModelObserver};
use crate::model::{Model, ModelMeta, Record};

type BootSlot<M> = OnceCell<Arc<BootedModel<M>>>;

static MODELS: Lazy<DashMap<TypeId, Arc<dyn Any + Send + Sync>>> = Lazy::new(DashMap::new);

/// Resolved metadata and hook handlers of a booted model type
pub struct BootedModel<M: Model> {
    meta: Arc<ModelMeta>,
    hooks: RwLock<HookRegistry<M>>,
}

impl<M: Model> BootedModel<M> {
    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    pub fn handlers(&self, point: HookPoint) -> Vec<Arc<dyn Hook<M>>> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers(point)
    }

    pub fn hook_count(&self, point: HookPoint) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .count(point)
    }

    /// Register an additional handler after boot
    pub fn add_hook<H: Hook<M> + 'static>(&self, point: HookPoint, hook: H) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(point, hook);
    }

    /// Register an observer at every hook point after boot
    pub fn observe<O: ModelObserver<M> + 'static>(&self, observer: O) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(observer);
    }
}

fn slot<M: Model>() -> Arc<BootSlot<M>> {
    let id = TypeId::of::<M>();
    let entry = MODELS
        .entry(id)
        .or_insert_with(|| Arc::new(BootSlot::<M>::new()) as Arc<dyn Any + Send + Sync>)
        .value()
        .clone();

    match entry.downcast::<BootSlot<M>>() {
        Ok(slot) => slot,
        Err(_) => {
            // Keyed by TypeId, so this only happens if the map was tampered with
            let fresh = Arc::new(BootSlot::<M>::new());
            MODELS.insert(id, fresh.clone());
            fresh
        }
    }
}

/// Boot `M` if it has not booted yet and return its booted state
pub fn boot<M: Model>() -> Arc<BootedModel<M>> {
    slot::<M>()
        .get_or_init(|| {
            let meta = M::descriptor().resolve(M::NAME);
            let mut hooks = HookRegistry::new();
            M::boot(&mut hooks);

            debug!(
                model = M::NAME,
                table = %meta.table,
                connection = meta.connection.as_deref().unwrap_or("default"),
                "booted model"
            );

            Arc::new(BootedModel {
                meta: Arc::new(meta),
                hooks: RwLock::new(hooks),
            })
        })
        .clone()
}

/// Whether `M` has completed its boot
pub fn is_booted<M: Model>() -> bool {
    MODELS
        .get(&TypeId::of::<M>())
        .map(|entry| entry.value().clone())
        .and_then(|entry| entry.downcast::<BootSlot<M>>().ok())
        .map(|slot| slot.get().is_some())
        .unwrap_or(false)
}

/// Register a closure hook on `M`, booting it first if needed
pub fn on<M, F>(point: HookPoint, handler: F)
where
    M: Model,
    F: Fn(&mut Record<M>) -> Result<(), HookError> + Send + Sync + 'static,
{
    boot::<M>().add_hook(point, crate::hooks::FnHook::new(handler));
}

/// Forget every booted model type and its hooks. Records already holding
/// their booted state keep it; new records boot again.
pub fn reset() {
    MODELS.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDescriptor;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BOOTS: AtomicUsize = AtomicUsize::new(0);

    struct Invoice;

    impl Model for Invoice {
        const NAME: &'static str = "Invoice";

        fn descriptor() -> ModelDescriptor {
            ModelDescriptor::new().connection("billing")
        }

        fn boot(hooks: &mut HookRegistry<Self>) {
            BOOTS.fetch_add(1, Ordering::SeqCst);
            hooks.on(HookPoint::BeforeCreate, |_| Ok(()));
        }
    }

    #[test]
    #[serial]
    fn test_boot_runs_once_and_resolves_descriptor() {
        reset();
        let before = BOOTS.load(Ordering::SeqCst);

        let first = boot::<Invoice>();
        let second = boot::<Invoice>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(BOOTS.load(Ordering::SeqCst), before + 1);
        assert_eq!(first.meta().table, "invoices");
        assert_eq!(first.meta().connection.as_deref(), Some("billing"));
        assert_eq!(first.hook_count(HookPoint::BeforeCreate), 1);
        assert!(is_booted::<Invoice>());
    }

    #[test]
    #[serial]
    fn test_reset_forces_a_fresh_boot() {
        reset();
        let first = boot::<Invoice>();
        reset();
        assert!(!is_booted::<Invoice>());

        let second = boot::<Invoice>();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.hook_count(HookPoint::BeforeCreate), 1);
    }
}
