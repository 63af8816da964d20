use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::error::CrawlError;
use crate::fetch::Fetcher;
use crate::manifest::write_atomic;
use crate::types::{ArticleMetadata, DownloadFailure, DownloadOutcome};

const MAX_BACKOFF_SHIFT: u32 = 10;

/// Fetches article PDFs under a run-wide transfer limit.
///
/// The semaphore is shared with every other category of the run, so the number of
/// simultaneous PDF transfers never exceeds its permit count.
pub struct Downloader<F> {
    fetcher: Arc<F>,
    permits: Arc<Semaphore>,
    max_retries: u32,
    backoff_ms: u64,
}

impl<F: Fetcher> Downloader<F> {
    #[must_use]
    pub fn new(fetcher: Arc<F>, permits: Arc<Semaphore>, max_retries: u32, backoff_ms: u64) -> Self {
        Self {
            fetcher,
            permits,
            max_retries,
            backoff_ms,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms << (attempt - 1).min(MAX_BACKOFF_SHIFT))
    }

    /// Download every article of one category into `dir` as `<id>.pdf`.
    ///
    /// Returns one outcome per article, in input order. A failed item never cancels
    /// the others.
    pub async fn download_batch(
        &self,
        dir: &Path,
        articles: &[ArticleMetadata],
    ) -> Vec<DownloadOutcome> {
        join_all(articles.iter().map(|a| self.download(dir, a))).await
    }

    async fn download(&self, dir: &Path, article: &ArticleMetadata) -> DownloadOutcome {
        let path = dir.join(format!("{}.pdf", article.id));
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.transfer(&path, &article.link).await {
                Ok(bytes) => {
                    tracing::debug!(id = %article.id, bytes, attempts, "pdf saved");
                    return DownloadOutcome::Saved {
                        id: article.id.clone(),
                        path,
                        bytes,
                        attempts,
                    };
                }
                Err(e) if e.is_transient() && attempts <= self.max_retries => {
                    let delay = self.backoff(attempts);
                    tracing::warn!(
                        id = %article.id,
                        "download failed: {e:#}, retrying in {}ms ({attempts}/{})",
                        delay.as_millis(),
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(id = %article.id, attempts, "download failed: {e:#}");
                    return DownloadOutcome::Failed(DownloadFailure {
                        id: article.id.clone(),
                        link: article.link.clone(),
                        error: e.to_string(),
                        attempts,
                    });
                }
            }
        }
    }

    /// One attempt; the permit covers the transfer and the file write.
    async fn transfer(&self, path: &Path, link: &str) -> Result<usize, CrawlError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CrawlError::PoolClosed)?;
        let body = self.fetcher.fetch(link).await?;
        write_atomic(path, &body).await?;
        Ok(body.len())
    }
}
