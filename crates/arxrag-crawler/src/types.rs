use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One article of a category listing. Field order is the on-disk manifest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub id: String,
    pub link: String,
    pub category: String,
}

/// A category listing page discovered on the homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTarget {
    pub listing_url: String,
    pub category: String,
}

/// Result of fetching one PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved {
        id: String,
        path: PathBuf,
        bytes: usize,
        attempts: u32,
    },
    Failed(DownloadFailure),
}

impl DownloadOutcome {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Saved { id, .. } => id,
            Self::Failed(f) => &f.id,
        }
    }

    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

/// A PDF that could not be stored; persisted next to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFailure {
    pub id: String,
    pub link: String,
    pub error: String,
    pub attempts: u32,
}
