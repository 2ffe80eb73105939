//! Handler registry: resources bound directly into render contexts.

use std::sync::Arc;

use mlua::Table;
use tracing::info;

use super::collection::{ResourceCollection, ScanOptions};
use super::events::ManagerEvent;
use super::manager::ResourceManager;
use super::{CollectionSettings, ResourceError, ResourceKind};
use crate::render::TemplateTracker;
use crate::script::ScriptRuntime;
use crate::watch::WatchHub;

/// Collection settings for the handler kind.
pub const HANDLER_SETTINGS: CollectionSettings = CollectionSettings {
    short: "handler",
    name: "Handler Function Path",
    default_subdir: "handlers",
    scan_extensions: &["lua"],
    method_name: "Handler",
};

/// Manages discovery, loading and context binding of handler functions.
pub struct HandlerManager {
    core: Arc<ResourceManager>,
}

impl HandlerManager {
    /// Creates a handler manager over a shared runtime and tracker.
    #[must_use]
    pub fn new(runtime: Arc<ScriptRuntime>, tracker: Arc<dyn TemplateTracker>) -> Self {
        Self {
            core: Arc::new(ResourceManager::new(
                ResourceKind::Handler,
                HANDLER_SETTINGS,
                runtime,
                tracker,
            )),
        }
    }

    /// The shared manager core (registry, hooks, settings accessors).
    #[must_use]
    pub fn core(&self) -> &ResourceManager {
        &self.core
    }

    /// Provides the collection settings for handlers.
    #[must_use]
    pub fn collection_settings(&self) -> &CollectionSettings {
        self.core.collection_settings()
    }

    /// Loads all handlers. Entry point for the handler manager's part in
    /// render operations.
    ///
    /// Emits `BeforeLoad`, loads every file the collection matches (zero
    /// matches logs an informational notice), registers the watch callback
    /// and emits `AfterLoad`. Returns how many handler files were loaded;
    /// scan and load failures propagate.
    pub async fn load_all(
        &self,
        collection: &ResourceCollection,
        watch: &WatchHub,
    ) -> Result<usize, ResourceError> {
        info!("loading all handlers");
        self.core.hooks().emit(&ManagerEvent::BeforeLoad {
            kind: ResourceKind::Handler,
        });

        let opts = ScanOptions {
            no_match: Some(Box::new(|| {
                info!("no handler functions were found or loaded");
            })),
        };
        let loaded = self.core.load_discovered(collection, &opts).await?;

        self.core.register_watcher(collection, watch);

        self.core.hooks().emit(&ManagerEvent::AfterLoad {
            kind: ResourceKind::Handler,
        });
        Ok(loaded)
    }

    /// Applies all loaded handlers to a context table, usually in
    /// preparation for a template compilation op.
    ///
    /// Mutates `context` in place, keying each wrapped handler by name, and
    /// returns it for convenience. An empty registry is a no-op.
    pub fn apply_handlers_to_context(&self, context: Table) -> mlua::Result<Table> {
        for (name, wrapped) in self.core.registry().snapshot() {
            context.set(name, wrapped)?;
        }
        Ok(context)
    }
}
