use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CrawlError;
use crate::manifest::{to_pretty_json, write_atomic};

pub const REPORT_FILE: &str = "crawl_report.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryStatus {
    Completed {
        articles: usize,
        downloaded: usize,
        failures: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub listing_url: String,
    #[serde(flatten)]
    pub status: CategoryStatus,
}

impl CategoryReport {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.status, CategoryStatus::Completed { .. })
    }
}

/// Outcome of one crawl run, one entry per attempted category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
}

impl CrawlReport {
    fn completed(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.categories.iter().filter_map(|c| match c.status {
            CategoryStatus::Completed {
                articles,
                downloaded,
                failures,
            } => Some((articles, downloaded, failures)),
            CategoryStatus::Failed { .. } => None,
        })
    }

    #[must_use]
    pub fn total_articles(&self) -> usize {
        self.completed().map(|(a, _, _)| a).sum()
    }

    #[must_use]
    pub fn total_downloaded(&self) -> usize {
        self.completed().map(|(_, d, _)| d).sum()
    }

    #[must_use]
    pub fn total_failed_downloads(&self) -> usize {
        self.completed().map(|(_, _, f)| f).sum()
    }

    #[must_use]
    pub fn failed_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| !c.is_completed())
            .map(|c| c.category.as_str())
            .collect()
    }

    pub fn log(&self) {
        let elapsed = self.finished_at - self.started_at;
        tracing::info!(
            categories = self.categories.len(),
            articles = self.total_articles(),
            downloaded = self.total_downloaded(),
            failed_downloads = self.total_failed_downloads(),
            elapsed_ms = elapsed.num_milliseconds(),
            "crawl finished"
        );
        for c in &self.categories {
            if let CategoryStatus::Failed { error } = &c.status {
                tracing::warn!(category = %c.category, url = %c.listing_url, "category failed: {error}");
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the report cannot be serialized or written.
    pub async fn write(&self, data_dir: &Path) -> Result<PathBuf, CrawlError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| CrawlError::io(data_dir, e))?;
        let path = data_dir.join(REPORT_FILE);
        write_atomic(&path, &to_pretty_json(self)?).await?;
        Ok(path)
    }
}
