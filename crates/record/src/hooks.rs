//! Lifecycle hooks
//!
//! Handlers are registered per model type and per [`HookPoint`], and run in
//! registration order around the persistence paths. The first handler that
//! returns an error stops the chain; the error surfaces to the caller as
//! `ModelError::HookAborted` and the pending write is skipped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{trace, warn};

use crate::error::{ModelError, ModelResult};
use crate::event_error::HookError;
use crate::events::HookPoint;
use crate::model::{Model, Record};

/// A single hook handler
#[async_trait]
pub trait Hook<M: Model>: Send + Sync {
    async fn handle(&self, record: &mut Record<M>) -> Result<(), HookError>;
}

/// Adapter turning a synchronous closure into a [`Hook`]
pub struct FnHook<F> {
    handler: F,
}

impl<F> FnHook<F> {
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<M, F> Hook<M> for FnHook<F>
where
    M: Model,
    F: Fn(&mut Record<M>) -> Result<(), HookError> + Send + Sync,
{
    async fn handle(&self, record: &mut Record<M>) -> Result<(), HookError> {
        (self.handler)(record)
    }
}

/// Observer with one method per hook point; every method defaults to a no-op
#[async_trait]
pub trait ModelObserver<M: Model>: Send + Sync {
    async fn creating(&self, _record: &mut Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn created(&self, _record: &Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn updating(&self, _record: &mut Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn updated(&self, _record: &Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn saving(&self, _record: &mut Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn saved(&self, _record: &Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn deleting(&self, _record: &mut Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn deleted(&self, _record: &Record<M>) -> Result<(), HookError> {
        Ok(())
    }

    async fn found(&self, _record: &mut Record<M>) -> Result<(), HookError> {
        Ok(())
    }
}

struct ObserverHook<O> {
    observer: Arc<O>,
    point: HookPoint,
}

#[async_trait]
impl<M, O> Hook<M> for ObserverHook<O>
where
    M: Model,
    O: ModelObserver<M>,
{
    async fn handle(&self, record: &mut Record<M>) -> Result<(), HookError> {
        match self.point {
            HookPoint::BeforeCreate => self.observer.creating(record).await,
            HookPoint::AfterCreate => self.observer.created(record).await,
            HookPoint::BeforeUpdate => self.observer.updating(record).await,
            HookPoint::AfterUpdate => self.observer.updated(record).await,
            HookPoint::BeforeSave => self.observer.saving(record).await,
            HookPoint::AfterSave => self.observer.saved(record).await,
            HookPoint::BeforeDelete => self.observer.deleting(record).await,
            HookPoint::AfterDelete => self.observer.deleted(record).await,
            HookPoint::AfterFind => self.observer.found(record).await,
        }
    }
}

/// Ordered hook handlers for one model type
pub struct HookRegistry<M: Model> {
    handlers: HashMap<HookPoint, Vec<Arc<dyn Hook<M>>>>,
}

impl<M: Model> HookRegistry<M> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a synchronous closure at `point`
    pub fn on<F>(&mut self, point: HookPoint, handler: F) -> &mut Self
    where
        F: Fn(&mut Record<M>) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.add(point, FnHook::new(handler))
    }

    /// Register any [`Hook`] implementation at `point`
    pub fn add<H>(&mut self, point: HookPoint, hook: H) -> &mut Self
    where
        H: Hook<M> + 'static,
    {
        self.handlers.entry(point).or_default().push(Arc::new(hook));
        self
    }

    /// Register an observer at every hook point
    pub fn observe<O>(&mut self, observer: O) -> &mut Self
    where
        O: ModelObserver<M> + 'static,
    {
        let observer = Arc::new(observer);
        for point in HookPoint::ALL {
            self.add(
                point,
                ObserverHook {
                    observer: observer.clone(),
                    point,
                },
            );
        }
        self
    }

    /// Snapshot of the handlers registered at `point`, in registration order
    pub fn handlers(&self, point: HookPoint) -> Vec<Arc<dyn Hook<M>>> {
        self.handlers.get(&point).cloned().unwrap_or_default()
    }

    pub fn count(&self, point: HookPoint) -> usize {
        self.handlers.get(&point).map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.values().all(Vec::is_empty)
    }
}

impl<M: Model> Default for HookRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every handler registered at `point` for the record's model type
pub(crate) async fn run<M: Model>(point: HookPoint, record: &mut Record<M>) -> ModelResult<()> {
    let handlers = record.booted().handlers(point);
    if handlers.is_empty() {
        return Ok(());
    }

    trace!(model = M::NAME, hook = %point, handlers = handlers.len(), "dispatching hook");

    for handler in handlers {
        if let Err(err) = handler.handle(record).await {
            warn!(model = M::NAME, hook = %point, reason = %err, "hook aborted operation");
            return Err(ModelError::HookAborted {
                hook: point.to_string(),
                reason: err.to_string(),
            });
        }
    }
    Ok(())
}

/// Run a sequence of hook points, stopping at the first failure
pub(crate) async fn run_all<M: Model>(points: &[HookPoint], record: &mut Record<M>) -> ModelResult<()> {
    for point in points {
        run(*point, record).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Note;

    impl Model for Note {
        const NAME: &'static str = "Note";
    }

    struct Quiet;

    #[async_trait]
    impl ModelObserver<Note> for Quiet {}

    #[test]
    fn test_registry_counts_per_point() {
        let mut hooks = HookRegistry::<Note>::new();
        assert!(hooks.is_empty());

        hooks
            .on(HookPoint::BeforeSave, |_| Ok(()))
            .on(HookPoint::BeforeSave, |_| Ok(()));
        hooks.observe(Quiet);

        assert!(!hooks.is_empty());
        assert_eq!(hooks.count(HookPoint::BeforeSave), 3);
        assert_eq!(hooks.count(HookPoint::AfterFind), 1);
        assert_eq!(hooks.handlers(HookPoint::AfterDelete).len(), 1);
    }

    static RAN: AtomicUsize = AtomicUsize::new(0);

    struct Chained;

    impl Model for Chained {
        const NAME: &'static str = "Chained";

        fn boot(hooks: &mut HookRegistry<Self>) {
            hooks
                .on(HookPoint::BeforeSave, |_| {
                    RAN.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .on(HookPoint::BeforeSave, |_| Err(HookError::rejected("no")))
                .on(HookPoint::BeforeSave, |_| {
                    RAN.fetch_add(100, Ordering::SeqCst);
                    Ok(())
                });
        }
    }

    #[tokio::test]
    async fn test_first_failure_stops_the_chain() {
        let mut record = Record::<Chained>::new();
        let before = RAN.load(Ordering::SeqCst);

        let err = run(HookPoint::BeforeSave, &mut record).await.unwrap_err();

        assert_eq!(RAN.load(Ordering::SeqCst), before + 1);
        assert_eq!(
            err,
            ModelError::HookAborted {
                hook: "before_save".to_string(),
                reason: "no".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_points_without_handlers_succeed() {
        let mut record = Record::<Chained>::new();
        assert!(run_all(&[HookPoint::AfterSave, HookPoint::AfterFind], &mut record)
            .await
            .is_ok());
    }
}
