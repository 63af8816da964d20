use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use super::{Chunk, Document, TextSplitter};
use crate::embedder::{EmbedError, Embedder};
use crate::error::MemoryError;
use crate::vector_store::{CollectionSpec, VectorPoint, VectorStore};

/// Summary of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub chunks: usize,
    pub batches: usize,
}

/// Deterministic point id: re-ingesting the same chunk overwrites it.
#[must_use]
pub fn point_id(key: &str, chunk_index: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{key}#{chunk_index}").as_bytes()).to_string()
}

fn payload(chunk: &Chunk) -> Result<HashMap<String, serde_json::Value>, MemoryError> {
    let mut value = json!({
        "content": chunk.content,
        "chunk_index": chunk.chunk_index,
        "source": chunk.metadata.source,
        "content_type": chunk.metadata.content_type,
    });
    if let Some(article) = &chunk.metadata.article
        && let (Some(map), serde_json::Value::Object(extra)) =
            (value.as_object_mut(), serde_json::to_value(article)?)
    {
        map.extend(extra);
    }
    Ok(serde_json::from_value(value)?)
}

/// Embeds chunks and writes them to a vector collection in fixed-size batches.
pub struct IngestionPipeline {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    hnsw_m: u64,
    hnsw_ef_construct: u64,
    batch_size: usize,
    recreate: bool,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
            hnsw_m: 16,
            hnsw_ef_construct: 100,
            batch_size: 50,
            recreate: false,
        }
    }

    #[must_use]
    pub fn with_hnsw(mut self, m: u64, ef_construct: u64) -> Self {
        self.hnsw_m = m;
        self.hnsw_ef_construct = ef_construct;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Drop any existing collection before the first batch is written.
    #[must_use]
    pub fn with_recreate(mut self, recreate: bool) -> Self {
        self.recreate = recreate;
        self
    }

    /// Embed and upsert `chunks` batch by batch, one embedding request per batch.
    ///
    /// The collection is created, or recreated, once the first vector reveals the
    /// embedding dimension. Every later vector must have the same dimension.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or storage fails; earlier batches stay written.
    pub async fn ingest_chunks(&self, chunks: &[Chunk]) -> Result<IngestReport, MemoryError> {
        let mut report = IngestReport::default();
        let mut dimension: Option<usize> = None;
        let total = chunks.len();

        for batch in chunks.chunks(self.batch_size) {
            let started = Instant::now();
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(EmbedError::BatchSize {
                    expected: batch.len(),
                    actual: vectors.len(),
                }
                .into());
            }

            let mut points = Vec::with_capacity(batch.len());
            for (chunk, vector) in batch.iter().zip(vectors) {
                match dimension {
                    None => {
                        self.prepare_collection(vector.len()).await?;
                        dimension = Some(vector.len());
                    }
                    Some(expected) if expected != vector.len() => {
                        return Err(MemoryError::DimensionMismatch {
                            expected,
                            actual: vector.len(),
                        });
                    }
                    Some(_) => {}
                }
                points.push(VectorPoint {
                    id: point_id(&chunk.metadata.key(), chunk.chunk_index),
                    vector,
                    payload: payload(chunk)?,
                });
            }

            self.store.upsert(&self.collection, points).await?;
            report.batches += 1;
            report.chunks += batch.len();
            tracing::info!(
                batch = report.batches,
                chunks = batch.len(),
                done = report.chunks,
                total,
                elapsed = ?started.elapsed(),
                "batch vectorized"
            );
        }

        Ok(report)
    }

    /// Split `documents` with `splitter` and ingest the resulting chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or storage fails.
    pub async fn ingest_documents(
        &self,
        splitter: &TextSplitter,
        documents: &[Document],
    ) -> Result<IngestReport, MemoryError> {
        let chunks = splitter.split_all(documents);
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "documents split"
        );
        self.ingest_chunks(&chunks).await
    }

    async fn prepare_collection(&self, vector_size: usize) -> Result<(), MemoryError> {
        let spec = CollectionSpec {
            vector_size: vector_size as u64,
            hnsw_m: self.hnsw_m,
            hnsw_ef_construct: self.hnsw_ef_construct,
        };
        if self.recreate {
            tracing::info!(collection = %self.collection, vector_size, "recreating collection");
            self.store
                .recreate_collection(&self.collection, spec)
                .await?;
        } else {
            self.store.ensure_collection(&self.collection, spec).await?;
        }
        Ok(())
    }
}
