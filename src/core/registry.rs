//! # Poller registry - process-wide name directory.
//!
//! [`PollerRegistry`] maps poller names to live [`Poller`] facades and enforces
//! name uniqueness:
//! - `register` → fails with [`PollerError::DuplicateName`] while a live poller holds the name
//! - `get_poller` → the instance or `None`; never constructs one
//! - `remove` → unconditional and idempotent
//!
//! ## Architecture
//! ```text
//! Poller::create(name) ──► PollerRegistry::register(name, Weak<poller>)
//!                                   │
//!           HashMap<String, Entry { id, Weak<dyn Any> }>
//!                                   │
//! get_poller::<T>(name) ◄───────────┘ upgrade + downcast
//!
//! Poller::destroy() / last handle dropped ──► remove entry (if still ours)
//! ```
//!
//! ## Rules
//! - The registry holds **non-owning** references: a poller's lifetime is controlled
//!   by its creator. An entry whose poller was dropped no longer counts as live.
//! - A single mutex guards the map; no strong reference is ever released while it is
//!   held (a poller's drop removes its own entry).
//! - [`PollerRegistry::global`] is the process-wide access point; tests and embedders
//!   can create isolated registries with [`PollerRegistry::new`] and reset them with
//!   [`PollerRegistry::clear`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;

use crate::core::poller::{Poller, PollerInner};
use crate::error::PollerError;

static GLOBAL: LazyLock<Arc<PollerRegistry>> = LazyLock::new(PollerRegistry::new);

/// Registered poller.
struct Entry {
    /// Identity of the poller instance (names can be reused).
    id: u64,
    poller: Weak<dyn Any + Send + Sync>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.poller.strong_count() > 0
    }
}

/// Directory of live pollers by name.
#[derive(Default)]
pub struct PollerRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl PollerRegistry {
    /// Creates an empty, isolated registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Process-wide registry used by [`Poller::create`].
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Registers `poller` under its name.
    ///
    /// Fails with [`PollerError::DuplicateName`] if another live poller holds the name.
    /// Registering the same instance twice is a no-op.
    pub fn register<T: Send + 'static>(&self, poller: &Poller<T>) -> Result<(), PollerError> {
        let weak: Weak<PollerInner<T>> = Arc::downgrade(poller.inner());
        self.insert(poller.name(), poller.id(), weak)
    }

    pub(crate) fn insert(
        &self,
        name: &str,
        id: u64,
        poller: Weak<dyn Any + Send + Sync>,
    ) -> Result<(), PollerError> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(name) {
            if existing.id == id {
                return Ok(());
            }
            if existing.is_live() {
                return Err(PollerError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        entries.insert(name.to_string(), Entry { id, poller });
        drop(entries);

        tracing::debug!(poller = name, "poller registered");
        Ok(())
    }

    /// Looks up a live poller producing results of type `T`.
    ///
    /// Returns `None` for unknown names, dropped pollers, and pollers of another
    /// result type.
    pub fn get_poller<T: Send + 'static>(&self, name: &str) -> Option<Poller<T>> {
        let weak = {
            let entries = self.entries.lock();
            Weak::clone(&entries.get(name)?.poller)
        };
        let inner = weak.upgrade()?.downcast::<PollerInner<T>>().ok()?;
        Some(Poller::from_inner(inner))
    }

    /// True if a live poller is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().get(name).is_some_and(Entry::is_live)
    }

    /// Removes the entry for `name`, if any. Idempotent.
    pub fn remove(&self, name: &str) {
        let removed = self.entries.lock().remove(name);
        if removed.is_some() {
            tracing::debug!(poller = name, "poller unregistered");
        }
    }

    /// Removes the entry for `name` only if it still belongs to poller `id`.
    pub(crate) fn remove_if(&self, name: &str, id: u64) {
        let mut entries = self.entries.lock();
        if entries.get(name).is_some_and(|e| e.id == id) {
            entries.remove(name);
            drop(entries);
            tracing::debug!(poller = name, "poller unregistered");
        }
    }

    /// Returns sorted names of live pollers.
    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock();
        let mut names: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_live())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of live pollers.
    pub fn len(&self) -> usize {
        self.entries.lock().values().filter(|e| e.is_live()).count()
    }

    /// Returns true if no live poller is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every entry. Running pollers keep running but their names are freed.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigUpdate;

    fn create(reg: &Arc<PollerRegistry>, name: &str) -> Result<Poller<u32>, PollerError> {
        Poller::builder(name).registry(reg.clone()).build()
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let reg = PollerRegistry::new();
        let first = create(&reg, "feed").unwrap();

        let err = create(&reg, "feed").unwrap_err();
        assert_eq!(
            err,
            PollerError::DuplicateName {
                name: "feed".into()
            }
        );

        // First poller stays registered and usable.
        let found = reg.get_poller::<u32>("feed").unwrap();
        assert_eq!(found.id(), first.id());
        found.set_config(ConfigUpdate::new().interval(std::time::Duration::from_secs(2)));
        assert_eq!(first.config().interval, std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let reg = PollerRegistry::new();
        assert!(reg.get_poller::<u32>("nope").is_none());
        assert!(!reg.contains("nope"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_lookup_with_wrong_type_is_none() {
        let reg = PollerRegistry::new();
        let _p = create(&reg, "typed").unwrap();
        assert!(reg.get_poller::<String>("typed").is_none());
        assert!(reg.get_poller::<u32>("typed").is_some());
    }

    #[test]
    fn test_remove_is_idempotent_and_frees_name() {
        let reg = PollerRegistry::new();
        let _p = create(&reg, "feed").unwrap();

        reg.remove("feed");
        reg.remove("feed");
        assert!(!reg.contains("feed"));

        assert!(create(&reg, "feed").is_ok());
    }

    #[test]
    fn test_dropped_poller_frees_name() {
        let reg = PollerRegistry::new();
        let p = create(&reg, "short-lived").unwrap();
        assert_eq!(reg.names(), vec!["short-lived".to_string()]);

        drop(p);
        assert!(!reg.contains("short-lived"));
        assert!(create(&reg, "short-lived").is_ok());
    }

    #[test]
    fn test_register_same_instance_twice_is_noop() {
        let reg = PollerRegistry::new();
        let p = create(&reg, "again").unwrap();
        assert!(reg.register(&p).is_ok());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_stale_destroy_does_not_remove_new_owner() {
        let reg = PollerRegistry::new();
        let old = create(&reg, "reused").unwrap();
        old.destroy();
        let new = create(&reg, "reused").unwrap();

        old.destroy();
        assert_eq!(reg.get_poller::<u32>("reused").map(|p| p.id()), Some(new.id()));
    }

    #[test]
    fn test_names_sorted_and_clear() {
        let reg = PollerRegistry::new();
        let _b = create(&reg, "b").unwrap();
        let _a = create(&reg, "a").unwrap();
        assert_eq!(reg.names(), vec!["a".to_string(), "b".to_string()]);

        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn test_concurrent_registration_allows_one_winner() {
        let reg = PollerRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = reg.clone();
                std::thread::spawn(move || create(&reg, "contested").ok())
            })
            .collect();
        let winners: Vec<Poller<u32>> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(winners.len(), 1);
        assert!(reg.contains("contested"));
    }
}
