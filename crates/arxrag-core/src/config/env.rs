use std::str::FromStr;

use super::Config;

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_crawler();
        self.apply_env_overrides_memory();
        self.apply_env_overrides_gateway();
    }

    fn apply_env_overrides_crawler(&mut self) {
        if let Ok(v) = std::env::var("ARXRAG_BASE_URL") {
            self.crawler.base_url = v;
        }
        if let Ok(v) = std::env::var("ARXRAG_DATA_DIR") {
            self.crawler.data_dir = v.into();
        }
        if let Some(n) = parsed("ARXRAG_CATEGORY_CONCURRENCY") {
            self.crawler.category_concurrency = n;
        }
        if let Some(n) = parsed("ARXRAG_PDF_CONCURRENCY") {
            self.crawler.pdf_concurrency = n;
        }
        if let Some(n) = parsed("ARXRAG_MAX_RETRIES") {
            self.crawler.max_retries = n;
        }
        if let Ok(v) = std::env::var("ARXRAG_CATEGORIES") {
            self.crawler.categories = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }

    fn apply_env_overrides_memory(&mut self) {
        if let Ok(v) = std::env::var("ARXRAG_OLLAMA_URL") {
            self.embedding.url = v;
        }
        if let Ok(v) = std::env::var("ARXRAG_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("ARXRAG_QDRANT_URL") {
            self.store.url = v;
        }
        if let Ok(v) = std::env::var("ARXRAG_COLLECTION") {
            self.store.collection = v;
        }
        if let Some(n) = parsed("ARXRAG_BATCH_SIZE") {
            self.ingest.batch_size = n;
        }
        if let Some(n) = parsed("ARXRAG_CHUNK_SIZE") {
            self.ingest.chunk_size = n;
        }
        if let Some(n) = parsed("ARXRAG_CHUNK_OVERLAP") {
            self.ingest.chunk_overlap = n;
        }
    }

    fn apply_env_overrides_gateway(&mut self) {
        if let Ok(v) = std::env::var("ARXRAG_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parsed("ARXRAG_GATEWAY_PORT") {
            self.gateway.port = port;
        }
    }
}
