//! Shared core of the handler and helper managers.
//!
//! Owns one name-keyed registry of callable resources of a single kind and
//! mediates discovery, loading, wrapping and watch-driven refresh. The
//! concrete managers compose their load passes from the operations here.

use std::sync::Arc;

use mlua::Function;
use tracing::{debug, info, warn};

use super::collection::{ResourceCollection, ScanOptions};
use super::events::{LoadedResource, ManagerEvent, ManagerHooks};
use super::registry::{RegistryEntry, ResourceRegistry};
use super::wrapper::{self, ManagerServices};
use super::{CollectionSettings, ResourceError, ResourceFile, ResourceKind};
use crate::render::TemplateTracker;
use crate::script::ScriptRuntime;
use crate::watch::{WatchEventKind, WatchHub};

/// Registry owner for one resource kind.
pub struct ResourceManager {
    kind: ResourceKind,
    settings: CollectionSettings,
    runtime: Arc<ScriptRuntime>,
    tracker: Arc<dyn TemplateTracker>,
    registry: ResourceRegistry,
    hooks: ManagerHooks,
}

impl ResourceManager {
    /// Creates a manager for `kind` over a shared script runtime and
    /// tracker.
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        settings: CollectionSettings,
        runtime: Arc<ScriptRuntime>,
        tracker: Arc<dyn TemplateTracker>,
    ) -> Self {
        Self {
            kind,
            settings,
            runtime,
            tracker,
            registry: ResourceRegistry::new(),
            hooks: ManagerHooks::new(),
        }
    }

    /// This manager's collection settings. Pure accessor, consumed by the
    /// path collection scanner.
    #[must_use]
    pub fn collection_settings(&self) -> &CollectionSettings {
        &self.settings
    }

    /// This manager's resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The live registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Observer registration for load-pass notifications.
    #[must_use]
    pub fn hooks(&self) -> &ManagerHooks {
        &self.hooks
    }

    /// The shared script runtime.
    #[must_use]
    pub fn runtime(&self) -> &ScriptRuntime {
        &self.runtime
    }

    /// Scans `collection` and loads every matched file, returning how many
    /// were loaded.
    ///
    /// Zero matches fires `opts.no_match` and is never an error. A failed
    /// scan or a failed individual load aborts the pass and propagates.
    pub(crate) async fn load_discovered(
        &self,
        collection: &ResourceCollection,
        opts: &ScanOptions,
    ) -> Result<usize, ResourceError> {
        let files = collection
            .each_resource(|file| self.load_one(file).map(|_| ()), opts)
            .await?;
        Ok(files.len())
    }

    /// Loads exactly one resource file and (re)installs it.
    ///
    /// The registry name is the file's base name; the module is evaluated
    /// fresh from its current on-disk content; the wrapped function
    /// replaces any prior entry for the name atomically. A load failure
    /// propagates — a broken resource file is a load-time error, not a
    /// runtime no-op.
    pub fn load_one(&self, file: &ResourceFile) -> Result<LoadedResource, ResourceError> {
        let name = file.base_name();
        let path = file.absolute_path();

        debug!("{} function loaded: {{{name}}}", self.settings.method_name);
        debug!("  source: {}", path.display());

        let original = self.runtime.require_latest(path)?;
        let wrapped = self.wrap(name, original.clone())?;

        self.registry.install(
            name,
            RegistryEntry {
                wrapped: wrapped.clone(),
                original: original.clone(),
                source: Some(path.to_path_buf()),
            },
        );

        let loaded = LoadedResource {
            kind: self.kind,
            name: name.to_string(),
            file: file.clone(),
            wrapped,
            original,
        };
        self.hooks.emit(&ManagerEvent::ResourceLoaded(loaded.clone()));
        Ok(loaded)
    }

    /// Installs a first-party resource under a fixed name, through the same
    /// wrapping path as discovered files.
    pub(crate) fn install_builtin(
        &self,
        name: &str,
        original: Function,
    ) -> Result<(), ResourceError> {
        debug!("adding built-in {}: {name}", self.kind);
        let wrapped = self.wrap(name, original.clone())?;
        self.registry.install(
            name,
            RegistryEntry {
                wrapped,
                original,
                source: None,
            },
        );
        Ok(())
    }

    /// Watch-event handler.
    ///
    /// On `Add` or `Change`, reloads the affected file and queues every
    /// render target holding a dependency edge on the resource for
    /// recompilation. `Remove` is deliberately ignored: the last-loaded
    /// entry stays live and dependents are not invalidated. Never
    /// propagates an error past this boundary — a reload failure is logged
    /// and the previous registry entry, if any, remains in place.
    pub fn handle_watch_update(&self, event: WatchEventKind, file: &ResourceFile) {
        match event {
            WatchEventKind::Add | WatchEventKind::Change => match self.load_one(file) {
                Ok(loaded) => {
                    info!("{} {{{}}} reloaded", self.kind, loaded.name);
                    self.tracker.trigger_ref_update(self.kind, &loaded.name);
                }
                Err(e) => {
                    warn!(
                        "reload of {} {{{}}} failed, keeping previous version: {e}",
                        self.kind,
                        file.base_name()
                    );
                }
            },
            WatchEventKind::Remove | WatchEventKind::Other => {}
        }
    }

    /// Registers this manager's watch handler for `collection`, so future
    /// add/change events route back into it.
    pub(crate) fn register_watcher(self: &Arc<Self>, collection: &ResourceCollection, watch: &WatchHub) {
        let manager = Arc::clone(self);
        watch.add_collection_watcher(collection.clone(), move |event, file| {
            manager.handle_watch_update(event, file);
        });
    }

    fn wrap(&self, name: &str, original: Function) -> Result<Function, ResourceError> {
        let services = ManagerServices::new(self.kind, self.settings);
        Ok(wrapper::wrap(
            self.runtime.lua(),
            self.kind,
            name,
            original,
            Arc::clone(&self.tracker),
            services,
        )?)
    }
}
