//! Resource extension system for vellum.
//!
//! A *resource* is a callable function exposed to template rendering under a
//! unique name. Resources come from two places: user-supplied Luau files
//! discovered under a collection's directories, and first-party built-ins
//! registered by the helper manager. Both go through the same
//! dependency-tracking wrapper, so every invocation during a render pass is
//! recorded against the active render target and filesystem edits trigger
//! selective recompilation of exactly the targets that depend on them.

pub mod collection;
pub mod events;
pub mod handlers;
pub mod helpers;
pub mod manager;
pub mod registry;
pub mod wrapper;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use collection::{ResourceCollection, ScanOptions};
pub use events::{LoadedResource, ManagerEvent, ManagerHooks};
pub use handlers::HandlerManager;
pub use helpers::HelperManager;
pub use manager::ResourceManager;
pub use registry::{RegistryEntry, ResourceRegistry};

/// Errors that can occur while discovering or loading resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// A collection directory could not be scanned.
    #[error("failed to scan {path}: {source}")]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A resource file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A resource file failed to evaluate (syntax or runtime error).
    #[error("failed to evaluate {path}: {source}")]
    Eval {
        /// File being evaluated.
        path: PathBuf,
        /// Script error raised during evaluation.
        source: mlua::Error,
    },
    /// A resource file evaluated to something other than a function.
    #[error("{path} did not evaluate to a function (got {type_name})")]
    NotAFunction {
        /// File that was evaluated.
        path: PathBuf,
        /// Type name of the value the file produced.
        type_name: String,
    },
    /// A script-level failure outside file evaluation (wrapper or binding
    /// construction).
    #[error("script error: {0}")]
    Script(#[from] mlua::Error),
}

/// The kind of a resource registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Bound directly into a render context by name.
    Handler,
    /// Invoked from template syntax via the helper-call convention.
    Helper,
}

impl ResourceKind {
    /// Short string form, used as the dependency-edge kind key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Handler => "handler",
            ResourceKind::Helper => "helper",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discoverable resource file.
///
/// The registry name is the file's base name with the extension stripped;
/// watch events for the same path re-resolve to an equal descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFile {
    name: String,
    path: PathBuf,
}

impl ResourceFile {
    /// Builds a descriptor from a path, deriving the registry name from the
    /// file's base name.
    #[must_use]
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { name, path }
    }

    /// The registry name derived from the file's base name.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the source file.
    #[must_use]
    pub fn absolute_path(&self) -> &Path {
        &self.path
    }
}

/// Static, declarative description of one scannable resource kind.
///
/// Immutable once constructed; one instance per kind. Consumed by the path
/// collection scanner to know where and how to look for files.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSettings {
    /// Short key identifying the collection (e.g. `"handler"`).
    pub short: &'static str,
    /// Human-readable name used in log messages.
    pub name: &'static str,
    /// Subdirectory scanned under each source root.
    pub default_subdir: &'static str,
    /// Accepted file extensions.
    pub scan_extensions: &'static [&'static str],
    /// Method-name convention used when naming built-ins.
    pub method_name: &'static str,
}
