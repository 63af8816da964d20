use std::collections::HashMap;
use std::sync::Arc;

use crate::embedder::Embedder;
use crate::error::MemoryError;
use crate::vector_store::{ScoredVectorPoint, VectorFilter, VectorStore};

/// Payload field the category filter matches on.
pub const CATEGORY_FIELD: &str = "category";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: f32,
    pub content: String,
    pub article_id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub category: Option<String>,
    pub chunk_index: Option<u64>,
}

fn text(payload: &HashMap<String, serde_json::Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str()).map(str::to_owned)
}

impl From<ScoredVectorPoint> for SearchHit {
    fn from(point: ScoredVectorPoint) -> Self {
        let p = &point.payload;
        Self {
            score: point.score,
            content: text(p, "content").unwrap_or_default(),
            article_id: text(p, "id"),
            title: text(p, "title"),
            link: text(p, "link"),
            category: text(p, CATEGORY_FIELD),
            chunk_index: p.get("chunk_index").and_then(serde_json::Value::as_u64),
        }
    }
}

/// Similarity search over an ingested collection.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
        }
    }

    /// Embed `query` and return the `limit` closest chunks, optionally only from one category.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or the store query fails.
    pub async fn search(
        &self,
        query: &str,
        limit: u64,
        category: Option<&str>,
    ) -> Result<Vec<SearchHit>, MemoryError> {
        let vector = self.embedder.embed(query).await?;
        let filter = category.map(|c| VectorFilter::field(CATEGORY_FIELD, c));
        let points = self
            .store
            .search(&self.collection, vector, limit, filter)
            .await?;
        tracing::debug!(
            collection = %self.collection,
            category,
            hits = points.len(),
            "similarity search"
        );
        Ok(points.into_iter().map(SearchHit::from).collect())
    }
}
