//! Pluggable per-tick behaviours.
//!
//! A behaviour is a strategy the registry runs once per tick for each fake
//! player it is attached to. Behaviours are resolved by name through the
//! [`BehaviourCatalog`]; every attachment gets its own stateful instance.

pub mod defaults;

use hashbrown::HashMap;

use crate::host::{HostError, HostServer};
use crate::identity::EntityHandle;

/// Everything a behaviour may touch during one tick
pub struct TickContext<'a> {
    pub entity: EntityHandle,
    pub tick: u64,
    pub host: &'a mut dyn HostServer,
}

/// A behaviour's per-tick logic failed; isolated by the caller
#[derive(Debug, thiserror::Error)]
pub enum BehaviourError {
    #[error("host call failed: {0}")]
    Host(#[from] HostError),
    #[error("{0}")]
    Failed(String),
}

/// Per-tick strategy driving one fake player
pub trait Behaviour: Send {
    fn name(&self) -> &'static str;

    fn on_tick(&mut self, ctx: &mut TickContext<'_>) -> Result<(), BehaviourError>;
}

/// Requested behaviour name is not in the catalog
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown behaviour '{0}'")]
pub struct UnknownBehaviourError(pub String);

type BehaviourFactory = Box<dyn Fn() -> Box<dyn Behaviour> + Send + Sync>;

/// Name-keyed catalog of constructible behaviours.
///
/// The default set is registered at startup; embedding applications extend
/// it through [`register`](Self::register) without touching the core.
#[derive(Default)]
pub struct BehaviourCatalog {
    factories: HashMap<String, BehaviourFactory>,
}

impl BehaviourCatalog {
    /// Empty catalog, no names resolvable
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the default behaviour set
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        defaults::register_defaults(&mut catalog);
        catalog
    }

    /// Register (or replace) a named behaviour constructor
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Behaviour> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Construct a fresh instance of the named behaviour
    pub fn create(&self, name: &str) -> Result<Box<dyn Behaviour>, UnknownBehaviourError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| UnknownBehaviourError(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered behaviour names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::InMemoryHost;

    struct CountingBehaviour {
        ticks: u64,
    }

    impl Behaviour for CountingBehaviour {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn on_tick(&mut self, _ctx: &mut TickContext<'_>) -> Result<(), BehaviourError> {
            self.ticks += 1;
            Ok(())
        }
    }

    #[test]
    fn test_catalog_unknown_name() {
        let catalog = BehaviourCatalog::with_defaults();
        let result = catalog.create("does-not-exist");
        assert!(matches!(result, Err(UnknownBehaviourError(name)) if name == "does-not-exist"));
    }

    #[test]
    fn test_catalog_defaults_present() {
        let catalog = BehaviourCatalog::with_defaults();
        assert!(catalog.contains("idle"));
        assert!(catalog.contains("wander"));
        assert!(catalog.contains("patrol"));
    }

    #[test]
    fn test_catalog_extension() {
        let mut catalog = BehaviourCatalog::new();
        catalog.register("counting", || Box::new(CountingBehaviour { ticks: 0 }));

        let behaviour = catalog.create("counting").unwrap();
        assert_eq!(behaviour.name(), "counting");
    }

    #[test]
    fn test_instances_are_independent() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        struct SharedCount(Arc<AtomicU64>);

        impl Behaviour for SharedCount {
            fn name(&self) -> &'static str {
                "shared-count"
            }
            fn on_tick(&mut self, _ctx: &mut TickContext<'_>) -> Result<(), BehaviourError> {
                self.0.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }

        // Each create() call must run the factory again, yielding a fresh
        // instance rather than a clone of one shared value
        let instances = Arc::new(AtomicU64::new(0));
        let mut catalog = BehaviourCatalog::new();
        let counter = instances.clone();
        catalog.register("shared-count", move || {
            counter.fetch_add(1, Ordering::Relaxed);
            Box::new(SharedCount(Arc::new(AtomicU64::new(0))))
        });

        let mut host = InMemoryHost::new();
        let mut a = catalog.create("shared-count").unwrap();
        let _b = catalog.create("shared-count").unwrap();
        assert_eq!(instances.load(Ordering::Relaxed), 2);

        let mut ctx = TickContext {
            entity: EntityHandle(1),
            tick: 0,
            host: &mut host,
        };
        a.on_tick(&mut ctx).unwrap();
    }

    #[test]
    fn test_names_sorted() {
        let catalog = BehaviourCatalog::with_defaults();
        let names = catalog.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
