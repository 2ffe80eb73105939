//! Embedded script runtime for user function modules.
//!
//! Resource files are Luau chunks whose evaluation yields a function. The
//! runtime is shared between the managers and the rendering engine so that
//! loaded functions and render contexts live in one script state.

use std::fs;
use std::path::Path;

use mlua::{Function, Lua, Value};

use crate::resource::ResourceError;

/// Owns the Luau state used for loading and invoking resource functions.
pub struct ScriptRuntime {
    lua: Lua,
}

impl Default for ScriptRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRuntime {
    /// Creates a fresh script state.
    #[must_use]
    pub fn new() -> Self {
        Self { lua: Lua::new() }
    }

    /// The underlying Lua state.
    #[must_use]
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// Loads the function exported by the file at `path`, freshly.
    ///
    /// Every call re-reads and re-evaluates the file's current on-disk
    /// content; there is no module cache, so an edit made after process
    /// start is observed by the next load. Fails on read errors, on
    /// syntax/runtime errors during evaluation, and when the chunk does not
    /// evaluate to a function.
    pub fn require_latest(&self, path: &Path) -> Result<Function, ResourceError> {
        let source = fs::read_to_string(path).map_err(|e| ResourceError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let value: Value = self
            .lua
            .load(&source)
            .set_name(path.display().to_string())
            .eval()
            .map_err(|e| ResourceError::Eval {
                path: path.to_path_buf(),
                source: e,
            })?;

        match value {
            Value::Function(f) => Ok(f),
            other => Err(ResourceError::NotAFunction {
                path: path.to_path_buf(),
                type_name: other.type_name().to_string(),
            }),
        }
    }
}
