mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file, then apply `ARXRAG_*` overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings that would stall or corrupt a run.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        let c = &self.crawler;
        if c.base_url.trim().is_empty() {
            bail!("crawler.base_url must not be empty");
        }
        if c.category_concurrency == 0 {
            bail!("crawler.category_concurrency must be at least 1");
        }
        if c.pdf_concurrency == 0 {
            bail!("crawler.pdf_concurrency must be at least 1");
        }
        if !c.listing_suffix.starts_with('/') {
            bail!("crawler.listing_suffix must start with '/'");
        }
        if self.embedding.url.trim().is_empty() {
            bail!("embedding.url must not be empty");
        }
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        if self.store.url.trim().is_empty() {
            bail!("store.url must not be empty");
        }
        if self.store.collection.trim().is_empty() {
            bail!("store.collection must not be empty");
        }
        let i = &self.ingest;
        if i.batch_size == 0 {
            bail!("ingest.batch_size must be at least 1");
        }
        if i.chunk_size == 0 {
            bail!("ingest.chunk_size must be at least 1");
        }
        if i.chunk_overlap >= i.chunk_size {
            bail!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                i.chunk_overlap,
                i.chunk_size
            );
        }
        Ok(())
    }
}
