//! Integration tests for the resource managers.
//!
//! These tests verify the complete load pass: discovery, registry
//! uniqueness, load-pass notifications, context binding and built-in
//! helper registration.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use vellum::render::MarkdownConverter;
use vellum::resource::handlers::HANDLER_SETTINGS;
use vellum::resource::helpers::HELPER_SETTINGS;
use vellum::resource::{ManagerEvent, ResourceCollection};
use vellum::{HandlerManager, HelperManager, RenderTracker, ResourceKind, ScriptRuntime, WatchHub};

/// Markdown converter stub; wraps input so tests can see what reached it.
struct TagConverter;

impl MarkdownConverter for TagConverter {
    fn parse(&self, text: &str) -> String {
        format!("<html>{text}</html>")
    }
}

fn write_resource(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(format!("{name}.lua")), body).expect("write resource file");
}

fn handler_setup() -> (Arc<ScriptRuntime>, Arc<RenderTracker>, WatchHub, HandlerManager) {
    let runtime = Arc::new(ScriptRuntime::new());
    let tracker = Arc::new(RenderTracker::new());
    let watch = WatchHub::new();
    let handlers = HandlerManager::new(Arc::clone(&runtime), tracker.clone());
    (runtime, tracker, watch, handlers)
}

fn helper_setup() -> (Arc<RenderTracker>, WatchHub, HelperManager) {
    let runtime = Arc::new(ScriptRuntime::new());
    let tracker = Arc::new(RenderTracker::new());
    let watch = WatchHub::new();
    let helpers = HelperManager::new(runtime, tracker.clone(), Arc::new(TagConverter));
    (tracker, watch, helpers)
}

fn collection_over(dir: &Path, handler_kind: bool) -> ResourceCollection {
    let settings = if handler_kind {
        HANDLER_SETTINGS
    } else {
        HELPER_SETTINGS
    };
    ResourceCollection::new(settings, vec![dir.to_path_buf()])
}

// ============================================================================
// Load Pass Tests
// ============================================================================

mod load_pass {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_load_all_registers_discovered_handlers() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_resource(
            dir.path(),
            "uppercase",
            "return function(chunk) return string.upper(chunk) end",
        );
        write_resource(
            dir.path(),
            "lowercase",
            "return function(chunk) return string.lower(chunk) end",
        );

        let (_runtime, _tracker, watch, handlers) = handler_setup();
        let col = collection_over(dir.path(), true);
        let loaded = handlers.load_all(&col, &watch).await.expect("load_all");

        assert_eq!(loaded, 2);
        let registry = handlers.core().registry();
        assert!(registry.contains("uppercase"));
        assert!(registry.contains("lowercase"));

        let upper = registry.get_wrapped("uppercase").expect("entry");
        let out: String = upper.call("abc").expect("call");
        assert_eq!(out, "ABC");
    }

    #[tokio::test]
    async fn test_empty_directory_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_runtime, _tracker, watch, handlers) = handler_setup();
        let col = collection_over(dir.path(), true);

        let loaded = handlers.load_all(&col, &watch).await.expect("load_all");
        assert_eq!(loaded, 0);
        assert!(handlers.core().registry().is_empty());
    }

    #[tokio::test]
    async fn test_colliding_names_keep_most_recent_load() {
        let root_a = tempfile::tempdir().expect("tempdir a");
        let root_b = tempfile::tempdir().expect("tempdir b");
        write_resource(root_a.path(), "dup", "return function() return 'first' end");
        write_resource(root_b.path(), "dup", "return function() return 'second' end");

        let (_runtime, _tracker, watch, handlers) = handler_setup();
        let col = ResourceCollection::new(
            HANDLER_SETTINGS,
            vec![root_a.path().to_path_buf(), root_b.path().to_path_buf()],
        );
        handlers.load_all(&col, &watch).await.expect("load_all");

        let registry = handlers.core().registry();
        assert_eq!(registry.len(), 1);

        // Files are visited in path order, so whichever root sorts last
        // supplies the surviving entry.
        let expected = if root_a.path() < root_b.path() {
            "second"
        } else {
            "first"
        };
        let dup = registry.get_wrapped("dup").expect("entry");
        let out: String = dup.call(()).expect("call");
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn test_broken_file_fails_the_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_resource(dir.path(), "broken", "return function(");

        let (_runtime, _tracker, watch, handlers) = handler_setup();
        let col = collection_over(dir.path(), true);
        assert!(handlers.load_all(&col, &watch).await.is_err());
    }

    #[tokio::test]
    async fn test_notification_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_resource(dir.path(), "only", "return function() return 0 end");

        let (_runtime, _tracker, watch, handlers) = handler_setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        handlers.core().hooks().subscribe(move |event| {
            let label = match event {
                ManagerEvent::BeforeLoad { .. } => "before".to_string(),
                ManagerEvent::AfterLoad { .. } => "after".to_string(),
                ManagerEvent::ResourceLoaded(loaded) => format!("loaded:{}", loaded.name),
            };
            sink.lock().expect("lock").push(label);
        });

        let col = collection_over(dir.path(), true);
        handlers.load_all(&col, &watch).await.expect("load_all");

        assert_eq!(
            seen.lock().expect("lock").as_slice(),
            &[
                "before".to_string(),
                "loaded:only".to_string(),
                "after".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_resource_loaded_carries_both_functions() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_resource(dir.path(), "probe", "return function() return 7 end");

        let (_runtime, _tracker, watch, handlers) = handler_setup();
        let captured = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&captured);
        handlers.core().hooks().subscribe(move |event| {
            if let ManagerEvent::ResourceLoaded(loaded) = event {
                *sink.lock().expect("lock") = Some(loaded.clone());
            }
        });

        let col = collection_over(dir.path(), true);
        handlers.load_all(&col, &watch).await.expect("load_all");

        let loaded = captured.lock().expect("lock").take().expect("event fired");
        assert_eq!(loaded.kind, ResourceKind::Handler);
        assert_eq!(loaded.name, "probe");
        assert_eq!(loaded.file.base_name(), "probe");
        assert_eq!(loaded.original.call::<i64>(()).expect("original"), 7);
        assert_eq!(loaded.wrapped.call::<i64>(()).expect("wrapped"), 7);
    }
}

// ============================================================================
// Context Binding Tests
// ============================================================================

mod context_binding {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_apply_handlers_to_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_resource(
            dir.path(),
            "shout",
            "return function(chunk) return string.upper(chunk) end",
        );

        let (runtime, _tracker, watch, handlers) = handler_setup();
        let col = collection_over(dir.path(), true);
        handlers.load_all(&col, &watch).await.expect("load_all");

        let context = runtime.lua().create_table().expect("table");
        let context = handlers
            .apply_handlers_to_context(context)
            .expect("apply");

        let shout: mlua::Function = context.get("shout").expect("bound");
        let out: String = shout.call("abc").expect("call");
        assert_eq!(out, "ABC");
    }

    #[tokio::test]
    async fn test_apply_with_empty_registry_is_noop() {
        let (runtime, _tracker, _watch, handlers) = handler_setup();
        let context = runtime.lua().create_table().expect("table");
        let context = handlers
            .apply_handlers_to_context(context)
            .expect("apply");
        assert_eq!(context.len().expect("len"), 0);
    }
}

// ============================================================================
// Built-in Helper Tests
// ============================================================================

mod builtins {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_markdown_registered_without_user_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_tracker, watch, helpers) = helper_setup();
        let col = collection_over(dir.path(), false);

        let loaded = helpers.load_all(&col, &watch).await.expect("load_all");
        assert_eq!(loaded, 0);
        assert!(helpers.core().registry().contains("markdown"));
    }

    #[tokio::test]
    async fn test_markdown_tracks_dependencies_like_user_helpers() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_resource(
            dir.path(),
            "shout",
            "return function(chunk) return string.upper(chunk) end",
        );

        let (tracker, watch, helpers) = helper_setup();
        let col = collection_over(dir.path(), false);
        helpers.load_all(&col, &watch).await.expect("load_all");

        let registry = helpers.core().registry();
        let markdown = registry.get_wrapped("markdown").expect("builtin");
        let shout = registry.get_wrapped("shout").expect("user helper");

        let lua = helpers.core().runtime().lua();
        let bodies = lua.create_table().expect("table");
        let block = lua
            .create_function(|_, (_chunk, _context): (mlua::Value, mlua::Value)| Ok("*text*"))
            .expect("block");
        bodies.set("block", block).expect("set");

        tracker.begin_target("page/post");
        let html: String = markdown
            .call((mlua::Value::Nil, mlua::Value::Nil, bodies))
            .expect("markdown call");
        let _: String = shout.call("hi").expect("shout call");
        tracker.end_target();

        assert_eq!(html, "<html>*text*</html>");
        assert_eq!(
            tracker.dependents_of(ResourceKind::Helper, "markdown"),
            vec!["page/post".to_string()]
        );
        assert_eq!(
            tracker.dependents_of(ResourceKind::Helper, "shout"),
            vec!["page/post".to_string()]
        );
    }
}
