//! Helper registry: resources invoked from template syntax, plus the
//! built-in helpers every pipeline carries.

use std::sync::Arc;

use mlua::{Function, Lua, MultiValue, Value};
use tracing::info;

use super::collection::{ResourceCollection, ScanOptions};
use super::events::ManagerEvent;
use super::manager::ResourceManager;
use super::{CollectionSettings, ResourceError, ResourceKind};
use crate::render::{MarkdownConverter, TemplateTracker};
use crate::script::ScriptRuntime;
use crate::watch::WatchHub;

/// Collection settings for the helper kind.
pub const HELPER_SETTINGS: CollectionSettings = CollectionSettings {
    short: "helper",
    name: "Helper Function Path",
    default_subdir: "helpers",
    scan_extensions: &["lua"],
    method_name: "Helper",
};

/// Manages discovery and loading of helper functions, including built-ins.
pub struct HelperManager {
    core: Arc<ResourceManager>,
    converter: Arc<dyn MarkdownConverter>,
}

impl HelperManager {
    /// Creates a helper manager over a shared runtime and tracker, with the
    /// Markdown converter the built-in `markdown` helper delegates to.
    #[must_use]
    pub fn new(
        runtime: Arc<ScriptRuntime>,
        tracker: Arc<dyn TemplateTracker>,
        converter: Arc<dyn MarkdownConverter>,
    ) -> Self {
        Self {
            core: Arc::new(ResourceManager::new(
                ResourceKind::Helper,
                HELPER_SETTINGS,
                runtime,
                tracker,
            )),
            converter,
        }
    }

    /// The shared manager core (registry, hooks, settings accessors).
    #[must_use]
    pub fn core(&self) -> &ResourceManager {
        &self.core
    }

    /// Provides the collection settings for helpers.
    #[must_use]
    pub fn collection_settings(&self) -> &CollectionSettings {
        self.core.collection_settings()
    }

    /// Loads all helpers. Entry point for the helper manager's part in
    /// render operations.
    ///
    /// Emits `BeforeLoad`, loads every file the collection matches (zero
    /// matches logs an informational notice), registers the built-in
    /// helpers, registers the watch callback and emits `AfterLoad`.
    /// Returns how many helper files were loaded; scan and load failures
    /// propagate.
    pub async fn load_all(
        &self,
        collection: &ResourceCollection,
        watch: &WatchHub,
    ) -> Result<usize, ResourceError> {
        info!("loading all helpers");
        self.core.hooks().emit(&ManagerEvent::BeforeLoad {
            kind: ResourceKind::Helper,
        });

        let opts = ScanOptions {
            no_match: Some(Box::new(|| {
                info!("no custom helper functions were found or loaded");
            })),
        };
        let loaded = self.core.load_discovered(collection, &opts).await?;

        self.register_builtins()?;
        self.core.register_watcher(collection, watch);

        self.core.hooks().emit(&ManagerEvent::AfterLoad {
            kind: ResourceKind::Helper,
        });
        Ok(loaded)
    }

    /// Registers every built-in helper through the same wrapping path used
    /// for discovered files, so built-ins participate in dependency
    /// tracking identically to user-supplied helpers.
    fn register_builtins(&self) -> Result<(), ResourceError> {
        let markdown = markdown_helper(self.core.runtime().lua(), Arc::clone(&self.converter))?;
        self.core.install_builtin("markdown", markdown)?;
        Ok(())
    }
}

/// The original (unwrapped) function for the built-in `markdown` helper.
///
/// Contract: the nested body is rendered first, so template expressions
/// inside it are resolved, and only the rendered text goes through the
/// Markdown converter — conversion happens after template interpolation,
/// not before. The helper receives the usual `(chunk, context, bodies,
/// params)` arguments; `bodies.block` is the callable that renders the
/// nested content for a chunk and context.
fn markdown_helper(
    lua: &Lua,
    converter: Arc<dyn MarkdownConverter>,
) -> Result<Function, ResourceError> {
    let f = lua.create_function(move |lua, args: MultiValue| {
        let mut args = args.into_iter();
        let chunk = args.next().unwrap_or(Value::Nil);
        let context = args.next().unwrap_or(Value::Nil);
        let bodies = args.next().unwrap_or(Value::Nil);

        let rendered: String = match &bodies {
            Value::Table(t) => match t.get::<Option<Function>>("block")? {
                Some(block) => block.call((chunk, context))?,
                None => String::new(),
            },
            _ => String::new(),
        };

        let html = converter.parse(&rendered);
        lua.create_string(&html).map(Value::String)
    })?;
    Ok(f)
}
