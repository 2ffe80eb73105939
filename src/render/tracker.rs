//! Dependency tracking between render targets and resources.
//!
//! Every wrapped resource invocation records an edge from the active render
//! target to the resource's identity. When a resource file changes, the
//! watch handler asks the tracker to queue every target holding an edge on
//! that resource for recompilation.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::resource::ResourceKind;

/// Dependency-signal contract between the resource managers and the
/// template manager.
///
/// `add_template_dependency_ref` is called by the dependency-tracking
/// wrapper on every resource invocation; `trigger_ref_update` is called by
/// the watch handler after a successful reload.
pub trait TemplateTracker: Send + Sync {
    /// Records a dependency edge from the active render target to
    /// `(kind, name)`. A no-op when no target is active.
    fn add_template_dependency_ref(&self, kind: ResourceKind, name: &str);

    /// Queues every render target with a recorded edge on `(kind, name)`
    /// for recompilation.
    fn trigger_ref_update(&self, kind: ResourceKind, name: &str);
}

/// Identity of one resource in the dependency graph.
type ResourceRef = (ResourceKind, String);

#[derive(Default)]
struct TrackerState {
    /// Render target currently being compiled, if any.
    active: Option<String>,
    /// Resource -> targets that invoked it during their last render.
    dependents: HashMap<ResourceRef, HashSet<String>>,
    /// Target -> resources it invoked; used to recompute a target's edge
    /// set from scratch on each render.
    by_target: HashMap<String, HashSet<ResourceRef>>,
    /// Targets queued for recompilation, ordered for determinism.
    pending: BTreeSet<String>,
}

/// Concrete dependency graph with active-target bookkeeping.
///
/// The edge set for a target is recomputed fully per render: `begin_target`
/// drops the target's previous edges before new ones are recorded, so an
/// edge exists iff the target's most recent render actually invoked the
/// resource.
#[derive(Default)]
pub struct RenderTracker {
    state: Mutex<TrackerState>,
}

impl RenderTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `target` as the active render target and clears its previous
    /// edge set.
    pub fn begin_target(&self, target: &str) {
        let mut state = self.lock();
        if let Some(refs) = state.by_target.remove(target) {
            for r in refs {
                if let Some(targets) = state.dependents.get_mut(&r) {
                    targets.remove(target);
                }
            }
        }
        state.active = Some(target.to_string());
    }

    /// Clears the active render target.
    pub fn end_target(&self) {
        self.lock().active = None;
    }

    /// Render targets holding an edge on `(kind, name)`, sorted.
    #[must_use]
    pub fn dependents_of(&self, kind: ResourceKind, name: &str) -> Vec<String> {
        let state = self.lock();
        let mut targets: Vec<String> = state
            .dependents
            .get(&(kind, name.to_string()))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        targets
    }

    /// Drains the set of targets queued for recompilation.
    #[must_use]
    pub fn take_pending(&self) -> Vec<String> {
        let mut state = self.lock();
        std::mem::take(&mut state.pending).into_iter().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TemplateTracker for RenderTracker {
    fn add_template_dependency_ref(&self, kind: ResourceKind, name: &str) {
        let mut state = self.lock();
        let Some(target) = state.active.clone() else {
            return;
        };
        let resource = (kind, name.to_string());
        state
            .dependents
            .entry(resource.clone())
            .or_default()
            .insert(target.clone());
        state.by_target.entry(target).or_default().insert(resource);
    }

    fn trigger_ref_update(&self, kind: ResourceKind, name: &str) {
        let mut state = self.lock();
        let targets: Vec<String> = state
            .dependents
            .get(&(kind, name.to_string()))
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        debug!(
            "queueing {} render target(s) for update of {kind} {{{name}}}",
            targets.len()
        );
        state.pending.extend(targets);
    }
}
