#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    #[error("vector store error: {0}")]
    VectorStore(#[from] crate::vector_store::VectorStoreError),

    #[error("embedding error: {0}")]
    Embed(#[from] crate::embedder::EmbedError),

    #[error("document error: {0}")]
    Document(#[from] crate::document::DocumentError),

    #[error("dataset error: {0}")]
    Dataset(#[from] arxrag_crawler::CrawlError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("embedding dimension changed from {expected} to {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
