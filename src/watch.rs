//! Watch-mode event model and dispatch.
//!
//! The hub decouples event production from handling: managers register a
//! handler against their collection during a load pass, and whatever drives
//! watch mode — the embedding application, a test, or the optional
//! `notify`-backed source — feeds `(event, path)` pairs into
//! [`WatchHub::dispatch`], which routes them to every subscription whose
//! collection matches the path.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::resource::{ResourceCollection, ResourceFile};

#[cfg(feature = "watch")]
pub use fs_source::FsWatchSource;

/// Kind of a filesystem watch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// A matching file appeared.
    Add,
    /// A matching file's content changed.
    Change,
    /// A matching file was removed. Managers leave the last-loaded entry
    /// in place for this event.
    Remove,
    /// Anything else (renames, metadata). Ignored by managers.
    Other,
}

type WatchHandler = Box<dyn Fn(WatchEventKind, &ResourceFile) + Send + Sync>;

struct Subscription {
    collection: ResourceCollection,
    handler: WatchHandler,
}

/// Registry of collection-scoped watch handlers.
#[derive(Default)]
pub struct WatchHub {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl WatchHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events on files matching `collection`.
    pub fn add_collection_watcher(
        &self,
        collection: ResourceCollection,
        handler: impl Fn(WatchEventKind, &ResourceFile) + Send + Sync + 'static,
    ) {
        self.lock().push(Subscription {
            collection,
            handler: Box::new(handler),
        });
    }

    /// Routes one event to every subscription whose collection matches
    /// `path`, returning how many handlers ran.
    ///
    /// Handlers contain their own failures; dispatch never propagates an
    /// error, so one broken reload cannot stop later events from being
    /// processed.
    pub fn dispatch(&self, event: WatchEventKind, path: &Path) -> usize {
        let subscriptions = self.lock();
        let mut notified = 0;
        for sub in subscriptions.iter() {
            if sub.collection.matches(path) {
                let file = ResourceFile::from_path(path.to_path_buf());
                (sub.handler)(event, &file);
                notified += 1;
            }
        }
        notified
    }

    /// Union of all subscribed collection roots, for a filesystem source to
    /// watch.
    #[must_use]
    pub fn watched_roots(&self) -> Vec<PathBuf> {
        let subscriptions = self.lock();
        let mut roots: Vec<PathBuf> = subscriptions
            .iter()
            .flat_map(|s| s.collection.roots().iter().cloned())
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "watch")]
mod fs_source {
    //! `notify`-backed event source feeding a [`WatchHub`].

    use std::path::Path;
    use std::sync::Arc;

    use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
    use tracing::warn;

    use super::{WatchEventKind, WatchHub};

    /// Watches the hub's collection roots on a background thread and
    /// dispatches filesystem events into the hub.
    pub struct FsWatchSource {
        // Held for its Drop; dropping stops the watch threads.
        _watcher: RecommendedWatcher,
    }

    impl FsWatchSource {
        /// Starts watching every root currently subscribed on `hub`.
        pub fn spawn(hub: Arc<WatchHub>) -> notify::Result<Self> {
            let roots = hub.watched_roots();
            let dispatch_hub = Arc::clone(&hub);
            let mut watcher =
                notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                    Ok(event) => {
                        let kind = translate(&event.kind);
                        for path in &event.paths {
                            dispatch_hub.dispatch(kind, path);
                        }
                    }
                    Err(e) => warn!("watch error: {e}"),
                })?;
            for root in &roots {
                if root.exists() {
                    watcher.watch(Path::new(root), RecursiveMode::Recursive)?;
                }
            }
            Ok(Self { _watcher: watcher })
        }
    }

    fn translate(kind: &EventKind) -> WatchEventKind {
        match kind {
            EventKind::Create(_) => WatchEventKind::Add,
            EventKind::Modify(_) => WatchEventKind::Change,
            EventKind::Remove(_) => WatchEventKind::Remove,
            _ => WatchEventKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::resource::CollectionSettings;

    fn collection(root: &str) -> ResourceCollection {
        ResourceCollection::new(
            CollectionSettings {
                short: "handler",
                name: "Handler Function Path",
                default_subdir: "handlers",
                scan_extensions: &["lua"],
                method_name: "Handler",
            },
            vec![PathBuf::from(root)],
        )
    }

    #[test]
    fn test_dispatch_routes_to_matching_collections() {
        let hub = WatchHub::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        hub.add_collection_watcher(collection("/site/handlers"), move |event, file| {
            assert_eq!(event, WatchEventKind::Change);
            assert_eq!(file.base_name(), "upper");
            h.fetch_add(1, Ordering::SeqCst);
        });

        let notified = hub.dispatch(WatchEventKind::Change, Path::new("/site/handlers/upper.lua"));
        assert_eq!(notified, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Non-matching extension and path are not routed.
        assert_eq!(
            hub.dispatch(WatchEventKind::Change, Path::new("/site/handlers/upper.txt")),
            0
        );
        assert_eq!(
            hub.dispatch(WatchEventKind::Change, Path::new("/site/helpers/upper.lua")),
            0
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watched_roots_deduplicated() {
        let hub = WatchHub::new();
        hub.add_collection_watcher(collection("/site/handlers"), |_, _| {});
        hub.add_collection_watcher(collection("/site/handlers"), |_, _| {});
        hub.add_collection_watcher(collection("/site/helpers"), |_, _| {});

        assert_eq!(
            hub.watched_roots(),
            vec![
                PathBuf::from("/site/handlers"),
                PathBuf::from("/site/helpers")
            ]
        );
    }
}
