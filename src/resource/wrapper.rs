//! Dependency-tracking wrapper around loaded resource functions.
//!
//! Wrapping is a pure decorator step: given a callable and its identity,
//! produce a new callable that records a dependency edge before delegating.
//! Recording lives here rather than in resource authors' code, so every
//! invocation is tracked no matter how the resource is written — which is
//! what makes selective recompilation on file change sound.

use std::sync::Arc;

use mlua::{Function, Lua, MultiValue, UserData, UserDataMethods, Value};
use tracing::{debug, error, info, warn};

use super::{CollectionSettings, ResourceKind};
use crate::render::TemplateTracker;

/// Manager-level services passed to resource functions as a trailing
/// argument, so resource authors can reach logging and collection settings.
#[derive(Clone)]
pub struct ManagerServices {
    kind: ResourceKind,
    settings: CollectionSettings,
}

impl ManagerServices {
    /// Services handle for the manager of `kind`.
    #[must_use]
    pub fn new(kind: ResourceKind, settings: CollectionSettings) -> Self {
        Self { kind, settings }
    }
}

impl UserData for ManagerServices {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("log", |_, this, (level, msg): (String, String)| {
            let kind = this.kind.as_str();
            match level.as_str() {
                "debug" => debug!("[{kind}] {msg}"),
                "warn" => warn!("[{kind}] {msg}"),
                "error" => error!("[{kind}] {msg}"),
                _ => info!("[{kind}] {msg}"),
            }
            Ok(())
        });
        methods.add_method("kind", |_, this, ()| Ok(this.kind.as_str()));
        methods.add_method("collection_name", |_, this, ()| Ok(this.settings.name));
        methods.add_method("subdir", |_, this, ()| Ok(this.settings.default_subdir));
    }
}

/// Wraps `original` so every invocation records a dependency edge from the
/// active render target to `(kind, name)` before delegating.
///
/// The wrapper is transparent: the original receives the exact arguments
/// the wrapper was called with (chunk accumulator, context, bodies, params)
/// plus a trailing [`ManagerServices`] handle, and its return value — or
/// any error it raises — passes through unchanged.
pub fn wrap(
    lua: &Lua,
    kind: ResourceKind,
    name: &str,
    original: Function,
    tracker: Arc<dyn TemplateTracker>,
    services: ManagerServices,
) -> mlua::Result<Function> {
    let name = name.to_string();
    let services = lua.create_userdata(services)?;
    lua.create_function(move |_, args: MultiValue| {
        tracker.add_template_dependency_ref(kind, &name);

        let mut forwarded: Vec<Value> = args.into_iter().collect();
        forwarded.push(Value::UserData(services.clone()));
        original.call::<MultiValue>(MultiValue::from_iter(forwarded))
    })
}
