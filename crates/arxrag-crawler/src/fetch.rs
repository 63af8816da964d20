//! HTTP fetch layer shared by every worker of a crawl run.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use crate::config::CrawlerConfig;
use crate::error::CrawlError;

/// Source of page and PDF bodies.
///
/// Implementations must be safe to share read-only across concurrent workers.
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or when the response status is not 200.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, CrawlError>> + Send;
}

/// [`Fetcher`] backed by one pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build the connection pool for one crawl run.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("arxrag/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(CrawlError::Client)?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, CrawlError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_owned(),
                source,
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(CrawlError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|source| CrawlError::Http {
            url: url.to_owned(),
            source,
        })?;
        tracing::debug!(url, bytes = bytes.len(), "fetched");
        Ok(bytes.to_vec())
    }
}
