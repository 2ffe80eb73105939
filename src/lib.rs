//! Vellum
//!
//! Dependency-tracked, hot-reloadable resource registries for a
//! template-rendering pipeline.
//!
//! # Architecture
//!
//! - **Resource Module**: discovery, loading, wrapping and registries for
//!   handler and helper functions
//! - **Script Module**: embedded Luau runtime with fresh-from-disk loading
//! - **Render Module**: dependency tracking between render targets and
//!   resources, plus the Markdown converter seam
//! - **Watch Module**: collection-scoped watch registration and dispatch
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vellum::{Config, HandlerManager, RenderTracker, ScriptRuntime, WatchHub};
//!
//! # async fn run() -> Result<(), vellum::resource::ResourceError> {
//! let runtime = Arc::new(ScriptRuntime::new());
//! let tracker = Arc::new(RenderTracker::new());
//! let watch = WatchHub::new();
//!
//! let handlers = HandlerManager::new(runtime, tracker);
//! let collection = Config::default().collection_for(handlers.collection_settings());
//! handlers.load_all(&collection, &watch).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod render;
pub mod resource;
pub mod script;
pub mod watch;

// Re-export main types
pub use config::Config;
pub use render::{MarkdownConverter, RenderTracker, TemplateTracker};
pub use resource::{
    CollectionSettings, HandlerManager, HelperManager, ResourceFile, ResourceKind,
};
pub use script::ScriptRuntime;
pub use watch::{WatchEventKind, WatchHub};
