//! Path collection scanning.
//!
//! A collection pairs one kind's [`CollectionSettings`] with the concrete
//! directories to scan. Scanning is asynchronous and recursive; matched
//! files are visited in path order so load passes are deterministic.

use std::path::{Path, PathBuf};

use tracing::info;

use super::{CollectionSettings, ResourceError, ResourceFile};

/// Options for one scan pass.
#[derive(Default)]
pub struct ScanOptions {
    /// Invoked exactly once when zero files match. Defaults to an
    /// informational log; absence of resource files is never an error.
    pub no_match: Option<Box<dyn Fn() + Send + Sync>>,
}

/// One kind's settings bound to the directories it scans.
#[derive(Debug, Clone)]
pub struct ResourceCollection {
    settings: CollectionSettings,
    roots: Vec<PathBuf>,
}

impl ResourceCollection {
    /// Creates a collection over the given root directories.
    #[must_use]
    pub fn new(settings: CollectionSettings, roots: Vec<PathBuf>) -> Self {
        Self { settings, roots }
    }

    /// The settings this collection scans with.
    #[must_use]
    pub fn settings(&self) -> &CollectionSettings {
        &self.settings
    }

    /// The directories this collection scans.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether `path` belongs to this collection: under one of the roots,
    /// with an accepted extension.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.has_scan_extension(path) && self.roots.iter().any(|r| path.starts_with(r))
    }

    /// Asynchronously invokes `visitor` once per matched file, in path
    /// order.
    ///
    /// A missing root directory contributes zero matches rather than an
    /// error; an unreadable directory is a scan error and fails the pass.
    /// When nothing matches, the no-match callback fires exactly once and
    /// the visitor is never invoked. A visitor error aborts the iteration
    /// and propagates.
    pub async fn each_resource<F>(
        &self,
        mut visitor: F,
        opts: &ScanOptions,
    ) -> Result<Vec<ResourceFile>, ResourceError>
    where
        F: FnMut(&ResourceFile) -> Result<(), ResourceError>,
    {
        let mut files = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                continue;
            }
            self.scan_root(root, &mut files).await?;
        }
        files.sort_by(|a, b| a.absolute_path().cmp(b.absolute_path()));

        if files.is_empty() {
            match &opts.no_match {
                Some(cb) => cb(),
                None => info!("no {} files matched", self.settings.name),
            }
            return Ok(files);
        }

        for file in &files {
            visitor(file)?;
        }
        Ok(files)
    }

    async fn scan_root(
        &self,
        root: &Path,
        out: &mut Vec<ResourceFile>,
    ) -> Result<(), ResourceError> {
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries =
                tokio::fs::read_dir(&dir)
                    .await
                    .map_err(|e| ResourceError::Scan {
                        path: dir.clone(),
                        source: e,
                    })?;
            loop {
                let entry = entries.next_entry().await.map_err(|e| ResourceError::Scan {
                    path: dir.clone(),
                    source: e,
                })?;
                let Some(entry) = entry else { break };
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| ResourceError::Scan {
                    path: path.clone(),
                    source: e,
                })?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if self.has_scan_extension(&path) {
                    out.push(ResourceFile::from_path(path));
                }
            }
        }
        Ok(())
    }

    fn has_scan_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.settings.scan_extensions.contains(&ext))
    }
}
