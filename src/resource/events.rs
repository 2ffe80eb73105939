//! Load-pass notifications.
//!
//! Observers register explicitly and are notified synchronously at the
//! points the load pass defines: before any filesystem work, after each
//! resource install, and after the whole pass (including built-in
//! registration and watch registration) completes.

use std::sync::{Mutex, PoisonError};

use mlua::Function;

use super::{ResourceFile, ResourceKind};

/// A resource that was just installed into a registry.
#[derive(Clone)]
pub struct LoadedResource {
    /// Registry kind.
    pub kind: ResourceKind,
    /// Registry name.
    pub name: String,
    /// Source file the resource was loaded from.
    pub file: ResourceFile,
    /// The dependency-tracking wrapper now installed.
    pub wrapped: Function,
    /// The unwrapped function as evaluated from the file.
    pub original: Function,
}

/// Notification fired by a manager during a load pass.
#[derive(Clone)]
pub enum ManagerEvent {
    /// Emitted before any filesystem work of a load pass.
    BeforeLoad {
        /// Kind of the manager starting its pass.
        kind: ResourceKind,
    },
    /// Emitted after all file loads, built-in registration (helpers) and
    /// watch registration have completed.
    AfterLoad {
        /// Kind of the manager finishing its pass.
        kind: ResourceKind,
    },
    /// Emitted after a single resource is installed, carrying both the
    /// wrapped and original functions so observers can audit or further
    /// decorate resources.
    ResourceLoaded(LoadedResource),
}

type Observer = Box<dyn Fn(&ManagerEvent) + Send + Sync>;

/// Observer registration and synchronous notify.
#[derive(Default)]
pub struct ManagerHooks {
    observers: Mutex<Vec<Observer>>,
}

impl ManagerHooks {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer for all manager events.
    pub fn subscribe(&self, observer: impl Fn(&ManagerEvent) + Send + Sync + 'static) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Notifies every observer, in registration order.
    pub fn emit(&self, event: &ManagerEvent) {
        let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(event);
        }
    }
}
