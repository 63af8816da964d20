use serde::{Deserialize, Serialize};

fn default_embedding_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "bge-m3".into()
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    "arxiv".into()
}

fn default_hnsw_m() -> u64 {
    16
}

fn default_hnsw_ef_construct() -> u64 {
    100
}

fn default_search_ef() -> Option<u64> {
    Some(10)
}

fn default_batch_size() -> usize {
    50
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Ollama endpoint.
    #[serde(default = "default_embedding_url")]
    pub url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Qdrant gRPC endpoint.
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_hnsw_m")]
    pub hnsw_m: u64,
    #[serde(default = "default_hnsw_ef_construct")]
    pub hnsw_ef_construct: u64,
    /// Search-time beam width; `None` leaves the server default.
    #[serde(default = "default_search_ef")]
    pub search_ef: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            hnsw_m: default_hnsw_m(),
            hnsw_ef_construct: default_hnsw_ef_construct(),
            search_ef: default_search_ef(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Chunks embedded and upserted per round trip.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_true")]
    pub sentence_aware: bool,
    /// Drop and rebuild the collection before the first batch.
    #[serde(default)]
    pub recreate: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            sentence_aware: true,
            recreate: false,
        }
    }
}
