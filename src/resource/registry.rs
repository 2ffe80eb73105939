//! Name-keyed registry of live resource functions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mlua::Function;

/// The live, callable unit stored under a resource name.
#[derive(Clone)]
pub struct RegistryEntry {
    /// The dependency-tracking wrapper exposed to rendering.
    pub wrapped: Function,
    /// The unwrapped function as loaded from the source.
    pub original: Function,
    /// Source path; `None` for built-ins.
    pub source: Option<PathBuf>,
}

/// At most one entry per name; installing a colliding name replaces the
/// previous entry atomically, so no reader observes a half-updated entry
/// and the latest load always wins.
#[derive(Default)]
pub struct ResourceRegistry {
    entries: Mutex<HashMap<String, RegistryEntry>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `entry` under `name`, returning the replaced entry if one
    /// existed.
    pub fn install(&self, name: &str, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.lock().insert(name.to_string(), entry)
    }

    /// The current wrapped function for `name`.
    #[must_use]
    pub fn get_wrapped(&self, name: &str) -> Option<Function> {
        self.lock().get(name).map(|e| e.wrapped.clone())
    }

    /// A point-in-time snapshot of `(name, wrapped)` pairs, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Function)> {
        let mut pairs: Vec<(String, Function)> = self
            .lock()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.wrapped.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Whether an entry exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
