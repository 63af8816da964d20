//! Concurrent arXiv category crawler.
//!
//! Discovers category listing pages on the homepage, extracts article metadata,
//! writes a per-category `meta.json` manifest and downloads every PDF under two
//! independent limits: listing fetches and PDF transfers.

pub mod config;
pub mod coordinator;
pub mod downloader;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod manifest;
pub mod report;
pub mod types;

pub use config::CrawlerConfig;
pub use coordinator::Crawler;
pub use downloader::Downloader;
pub use error::{CrawlError, ExtractError};
pub use extract::{discover_targets, extract_listing};
pub use fetch::{Fetcher, HttpFetcher};
pub use manifest::{
    FAILURES_FILE, MANIFEST_FILE, read_failures, read_manifest, write_failures, write_manifest,
};
pub use report::{CategoryReport, CategoryStatus, CrawlReport};
pub use types::{ArticleMetadata, CategoryTarget, DownloadFailure, DownloadOutcome};
