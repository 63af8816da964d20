use std::collections::HashMap;
use std::sync::RwLock;

use crate::embedder::cosine_similarity;
use crate::vector_store::{
    BoxFuture, CollectionSpec, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    vector_size: u64,
    points: HashMap<String, StoredPoint>,
}

impl InMemoryCollection {
    fn new(spec: CollectionSpec) -> Self {
        Self {
            vector_size: spec.vector_size,
            points: HashMap::new(),
        }
    }
}

/// Brute-force cosine store with the same contract as [`crate::QdrantOps`].
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of points in `collection`, or `None` if it does not exist.
    #[must_use]
    pub fn len(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.points.len())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

fn matches_filter(payload: &HashMap<String, serde_json::Value>, filter: &VectorFilter) -> bool {
    filter
        .must
        .iter()
        .all(|cond| payload.get(&cond.field).and_then(|v| v.as_str()) == Some(cond.value.as_str()))
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection::new(spec));
            Ok(())
        })
    }

    fn recreate_collection(
        &self,
        collection: &str,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.insert(collection, InMemoryCollection::new(spec));
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            for p in points {
                if p.vector.len() as u64 != col.vector_size {
                    return Err(VectorStoreError::Upsert(format!(
                        "point {} has {} dimensions, collection expects {}",
                        p.id,
                        p.vector.len(),
                        col.vector_size
                    )));
                }
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let empty_filter = VectorFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .filter(|(_, sp)| matches_filter(&sp.payload, f))
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SPEC: CollectionSpec = CollectionSpec {
        vector_size: 2,
        hnsw_m: 16,
        hnsw_ef_construct: 100,
    };

    fn point(id: &str, vector: [f32; 2], category: &str) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector: vector.to_vec(),
            payload: HashMap::from([("category".to_owned(), json!(category))]),
        }
    }

    async fn seeded() -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", SPEC).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("a", [1.0, 0.0], "cs"),
                    point("b", [0.7, 0.7], "math"),
                    point("c", [0.0, 1.0], "cs"),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = seeded().await;
        let hits = store.search("c", vec![1.0, 0.1], 3, None).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn search_respects_limit_and_filter() {
        let store = seeded().await;
        let hits = store
            .search("c", vec![0.7, 0.7], 1, Some(VectorFilter::field("category", "cs")))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_ne!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn upsert_overwrites_same_id() {
        let store = seeded().await;
        store
            .upsert("c", vec![point("a", [0.0, 1.0], "cs")])
            .await
            .unwrap();
        assert_eq!(store.len("c"), Some(3));
    }

    #[tokio::test]
    async fn ensure_is_idempotent_and_recreate_empties() {
        let store = seeded().await;
        store.ensure_collection("c", SPEC).await.unwrap();
        assert_eq!(store.len("c"), Some(3));
        store.recreate_collection("c", SPEC).await.unwrap();
        assert_eq!(store.len("c"), Some(0));
    }

    #[tokio::test]
    async fn wrong_dimension_rejected() {
        let store = seeded().await;
        let bad = VectorPoint {
            id: "x".into(),
            vector: vec![1.0, 0.0, 0.0],
            payload: HashMap::new(),
        };
        assert!(store.upsert("c", vec![bad]).await.is_err());
    }

    #[tokio::test]
    async fn missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        assert!(!store.collection_exists("nope").await.unwrap());
        assert!(store.search("nope", vec![1.0], 1, None).await.is_err());
        assert!(store.upsert("nope", vec![]).await.is_err());
    }
}
