//! Article corpus loading, chunking, embedding and vector retrieval.
//!
//! [`CategoryDataset`] reads the crawler's output tree, [`IngestionPipeline`]
//! splits, embeds and upserts it into a [`VectorStore`], and [`Retriever`]
//! answers similarity queries with an optional category filter.

pub mod config;
pub mod dataset;
pub mod document;
pub mod embedder;
pub mod error;
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod retriever;
pub mod vector_store;

pub use config::{EmbeddingConfig, IngestConfig, StoreConfig};
pub use dataset::{CategoryDataset, DatasetSummary};
pub use document::{
    Chunk, Document, DocumentError, DocumentLoader, DocumentMetadata, IngestReport,
    IngestionPipeline, SplitterConfig, TextSplitter,
};
#[cfg(feature = "pdf")]
pub use document::PdfLoader;
pub use embedder::{EmbedError, Embedder, OllamaEmbedder, cosine_similarity};
pub use error::MemoryError;
pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use retriever::{CATEGORY_FIELD, Retriever, SearchHit};
pub use vector_store::{
    CollectionSpec, FieldCondition, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
