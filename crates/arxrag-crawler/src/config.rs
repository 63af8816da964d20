use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_base_url() -> String {
    "https://arxiv.org".into()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_category_concurrency() -> usize {
    4
}

fn default_pdf_concurrency() -> usize {
    8
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_listing_suffix() -> String {
    "/new".into()
}

/// Crawl targets, output layout, and the two independent worker limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Simultaneous listing page fetches and parses.
    #[serde(default = "default_category_concurrency")]
    pub category_concurrency: usize,
    /// Simultaneous PDF transfers, shared by every category of a run.
    #[serde(default = "default_pdf_concurrency")]
    pub pdf_concurrency: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_listing_suffix")]
    pub listing_suffix: String,
    /// Restrict the crawl to these category labels. Empty means every discovered category.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_dir: default_data_dir(),
            category_concurrency: default_category_concurrency(),
            pdf_concurrency: default_pdf_concurrency(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            listing_suffix: default_listing_suffix(),
            categories: Vec::new(),
        }
    }
}
