//! Crawl run orchestration.
//!
//! A run discovers categories on the homepage, then processes them concurrently:
//! each category fetches its listing under the category limit, writes `meta.json`,
//! and hands its articles to the shared [`Downloader`]. The run finishes once every
//! category has reported.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::config::CrawlerConfig;
use crate::downloader::Downloader;
use crate::error::CrawlError;
use crate::extract::{discover_targets, extract_listing, is_safe_label};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::manifest::{write_failures, write_manifest};
use crate::report::{CategoryReport, CategoryStatus, CrawlReport};
use crate::types::{CategoryTarget, DownloadOutcome};

pub struct Crawler<F> {
    config: CrawlerConfig,
    fetcher: Arc<F>,
    category_permits: Arc<Semaphore>,
    downloader: Downloader<F>,
}

impl Crawler<HttpFetcher> {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: CrawlerConfig) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: Fetcher> Crawler<F> {
    #[must_use]
    pub fn new(config: CrawlerConfig, fetcher: F) -> Self {
        let fetcher = Arc::new(fetcher);
        let category_permits = Arc::new(Semaphore::new(config.category_concurrency.max(1)));
        let pdf_permits = Arc::new(Semaphore::new(config.pdf_concurrency.max(1)));
        let downloader = Downloader::new(
            Arc::clone(&fetcher),
            pdf_permits,
            config.max_retries,
            config.retry_backoff_ms,
        );
        Self {
            config,
            fetcher,
            category_permits,
            downloader,
        }
    }

    /// Crawl every discovered category and write the run report.
    ///
    /// # Errors
    ///
    /// Returns an error only when the homepage cannot be fetched or parsed. Failures
    /// of individual categories are recorded in the report.
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        let started_at = Utc::now();
        let targets = self.discover().await?;
        tracing::info!(
            categories = targets.len(),
            category_limit = self.config.category_concurrency,
            pdf_limit = self.config.pdf_concurrency,
            "starting crawl"
        );

        let categories = join_all(targets.iter().map(|t| self.crawl_category(t))).await;
        let report = CrawlReport {
            started_at,
            finished_at: Utc::now(),
            categories,
        };
        report.log();
        match report.write(&self.config.data_dir).await {
            Ok(path) => tracing::info!(path = %path.display(), "crawl report written"),
            Err(e) => tracing::warn!("failed to write crawl report: {e:#}"),
        }
        Ok(report)
    }

    /// Fetch the homepage and select the category listings to crawl.
    ///
    /// # Errors
    ///
    /// Returns an error if the homepage cannot be fetched or its links resolved.
    pub async fn discover(&self) -> Result<Vec<CategoryTarget>, CrawlError> {
        let body = self.fetcher.fetch(&self.config.base_url).await?;
        let html = String::from_utf8_lossy(&body);
        let targets = discover_targets(&html, &self.config.base_url, &self.config.listing_suffix)?;
        Ok(self.select(targets))
    }

    fn select(&self, targets: Vec<CategoryTarget>) -> Vec<CategoryTarget> {
        let allow = &self.config.categories;
        if allow.is_empty() {
            return targets;
        }
        for wanted in allow {
            if !targets.iter().any(|t| &t.category == wanted) {
                tracing::warn!(category = %wanted, "configured category not found on homepage");
            }
        }
        targets
            .into_iter()
            .filter(|t| allow.contains(&t.category))
            .collect()
    }

    /// Crawl one category. Never fails: errors end up in the returned report.
    pub async fn crawl_category(&self, target: &CategoryTarget) -> CategoryReport {
        let status = match self.try_crawl_category(target).await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(category = %target.category, url = %target.listing_url, "category failed: {e:#}");
                CategoryStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        CategoryReport {
            category: target.category.clone(),
            listing_url: target.listing_url.clone(),
            status,
        }
    }

    async fn try_crawl_category(&self, target: &CategoryTarget) -> Result<CategoryStatus, CrawlError> {
        if !is_safe_label(&target.category) {
            return Err(CrawlError::UnsafeCategory(target.category.clone()));
        }

        let articles = {
            let _permit = self
                .category_permits
                .acquire()
                .await
                .map_err(|_| CrawlError::PoolClosed)?;
            let body = self.fetcher.fetch(&target.listing_url).await?;
            let html = String::from_utf8_lossy(&body);
            extract_listing(&html, &target.category, &self.config.base_url)?
        };
        tracing::info!(category = %target.category, articles = articles.len(), "listing parsed");

        let dir = self.config.data_dir.join(&target.category);
        write_manifest(&dir, &articles).await?;

        let outcomes = self.downloader.download_batch(&dir, &articles).await;
        let failures: Vec<_> = outcomes
            .into_iter()
            .filter_map(|o| match o {
                DownloadOutcome::Failed(f) => Some(f),
                DownloadOutcome::Saved { .. } => None,
            })
            .collect();
        write_failures(&dir, &failures).await?;

        let downloaded = articles.len() - failures.len();
        tracing::info!(
            category = %target.category,
            downloaded,
            failed = failures.len(),
            "category done"
        );
        Ok(CategoryStatus::Completed {
            articles: articles.len(),
            downloaded,
            failures: failures.len(),
        })
    }
}
