//! Render-side collaborator surface.
//!
//! The rendering engine proper lives outside this crate; these are the
//! contracts the resource managers depend on — dependency tracking and the
//! Markdown converter used by the built-in `markdown` helper.

pub mod tracker;

pub use tracker::{RenderTracker, TemplateTracker};

/// Converts Markdown text to HTML.
///
/// Pure and synchronous; consumed only by the built-in `markdown` helper,
/// which converts *after* template interpolation has been resolved.
pub trait MarkdownConverter: Send + Sync {
    /// Converts a block of Markdown to HTML.
    fn parse(&self, text: &str) -> String;
}
