//! Loads the crawler's output tree: one directory per category holding `meta.json`,
//! an optional `failed.json` and one `<id>.pdf` per downloaded article.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use arxrag_crawler::{ArticleMetadata, MANIFEST_FILE, read_failures, read_manifest};

use crate::document::{Document, DocumentLoader};
use crate::error::MemoryError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub categories: usize,
    pub documents: usize,
    /// Manifest entries listed in `failed.json`.
    pub skipped_failed: usize,
    /// Manifest entries with no file on disk.
    pub missing_files: usize,
    /// Files with no manifest entry.
    pub unlisted_files: usize,
    /// Files the loader could not read.
    pub unreadable: usize,
}

/// Every loadable article of a data directory, with manifest metadata attached.
#[derive(Debug, Default)]
pub struct CategoryDataset {
    pub documents: Vec<Document>,
    pub summary: DatasetSummary,
}

fn io_err(path: &Path, source: std::io::Error) -> MemoryError {
    MemoryError::Io {
        path: path.display().to_string(),
        source,
    }
}

async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, MemoryError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| io_err(dir, e))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_err(dir, e))? {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

impl CategoryDataset {
    /// Load every category directory under `data_dir`.
    ///
    /// Directories without `meta.json` are skipped. Per-file problems are logged and
    /// counted in the summary rather than failing the load.
    ///
    /// # Errors
    ///
    /// Returns an error if `data_dir` cannot be listed or a manifest cannot be parsed.
    pub async fn load(data_dir: &Path, loader: &dyn DocumentLoader) -> Result<Self, MemoryError> {
        let mut dataset = Self::default();
        for path in sorted_entries(data_dir).await? {
            if !path.is_dir() {
                continue;
            }
            if !path.join(MANIFEST_FILE).is_file() {
                tracing::debug!(dir = %path.display(), "no manifest, skipping");
                continue;
            }
            dataset.load_category(&path, loader).await?;
        }

        tracing::info!(
            categories = dataset.summary.categories,
            documents = dataset.summary.documents,
            skipped_failed = dataset.summary.skipped_failed,
            missing = dataset.summary.missing_files,
            unlisted = dataset.summary.unlisted_files,
            unreadable = dataset.summary.unreadable,
            "dataset loaded"
        );
        Ok(dataset)
    }

    async fn load_category(
        &mut self,
        dir: &Path,
        loader: &dyn DocumentLoader,
    ) -> Result<(), MemoryError> {
        let failed: HashSet<String> = read_failures(dir)
            .await?
            .into_iter()
            .map(|f| f.id)
            .collect();
        let mut pending: HashMap<String, ArticleMetadata> = HashMap::new();
        for article in read_manifest(dir).await? {
            if failed.contains(&article.id) {
                self.summary.skipped_failed += 1;
            } else {
                pending.insert(article.id.clone(), article);
            }
        }

        let extensions = loader.supported_extensions();
        let before = self.documents.len();
        for path in sorted_entries(dir).await? {
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.iter().any(|s| s.eq_ignore_ascii_case(e)));
            if !supported || !path.is_file() {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if failed.contains(id) {
                continue;
            }
            let Some(article) = pending.remove(id) else {
                tracing::warn!(file = %path.display(), "file has no manifest entry, skipping");
                self.summary.unlisted_files += 1;
                continue;
            };

            match loader.load(&path).await {
                Ok(docs) => {
                    for mut doc in docs {
                        doc.metadata.article = Some(article.clone());
                        self.documents.push(doc);
                    }
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), "failed to load: {e:#}");
                    self.summary.unreadable += 1;
                }
            }
        }

        if !pending.is_empty() {
            let mut ids: Vec<&String> = pending.keys().collect();
            ids.sort();
            tracing::warn!(dir = %dir.display(), missing = ?ids, "manifest entries without a file");
            self.summary.missing_files += pending.len();
        }

        let loaded = self.documents.len() - before;
        self.summary.categories += 1;
        self.summary.documents += loaded;
        tracing::info!(dir = %dir.display(), documents = loaded, "category loaded");
        Ok(())
    }
}
