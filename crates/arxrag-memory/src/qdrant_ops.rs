//! [`VectorStore`] backed by a Qdrant server over gRPC.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, HnswConfigDiffBuilder, PointStruct,
    ScoredPoint, SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
};

use crate::vector_store::{
    BoxFuture, CollectionSpec, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};

type QdrantResult<T> = Result<T, Box<qdrant_client::QdrantError>>;

#[derive(Clone)]
pub struct QdrantOps {
    client: Qdrant,
    search_ef: Option<u64>,
}

impl std::fmt::Debug for QdrantOps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantOps")
            .field("search_ef", &self.search_ef)
            .finish_non_exhaustive()
    }
}

impl QdrantOps {
    /// Connect lazily to the Qdrant gRPC endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built from `url`.
    pub fn new(url: &str) -> QdrantResult<Self> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;
        Ok(Self {
            client,
            search_ef: None,
        })
    }

    /// HNSW `ef` used at query time; `None` leaves the server default.
    #[must_use]
    pub fn with_search_ef(mut self, ef: Option<u64>) -> Self {
        self.search_ef = ef;
        self
    }

    async fn create(&self, collection: &str, spec: CollectionSpec) -> QdrantResult<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(spec.vector_size, Distance::Cosine))
                    .hnsw_config(
                        HnswConfigDiffBuilder::default()
                            .m(spec.hnsw_m)
                            .ef_construct(spec.hnsw_ef_construct),
                    ),
            )
            .await
            .map_err(Box::new)?;
        tracing::info!(collection, vector_size = spec.vector_size, "collection created");
        Ok(())
    }

    async fn exists(&self, collection: &str) -> QdrantResult<bool> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(Box::new)
    }

    async fn ensure(&self, collection: &str, spec: CollectionSpec) -> QdrantResult<()> {
        if self.exists(collection).await? {
            return Ok(());
        }
        self.create(collection, spec).await
    }

    async fn recreate(&self, collection: &str, spec: CollectionSpec) -> QdrantResult<()> {
        if self.exists(collection).await? {
            self.client
                .delete_collection(collection)
                .await
                .map_err(Box::new)?;
            tracing::info!(collection, "collection dropped");
        }
        self.create(collection, spec).await
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<Filter>,
    ) -> QdrantResult<Vec<ScoredPoint>> {
        let mut builder = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);
        if let Some(ef) = self.search_ef {
            builder = builder.params(SearchParamsBuilder::default().hnsw_ef(ef));
        }
        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        #[allow(deprecated)]
        let response = self.client.search_points(builder).await.map_err(Box::new)?;
        Ok(response.result)
    }
}

impl VectorStore for QdrantOps {
    fn ensure_collection(
        &self,
        collection: &str,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.ensure(&collection, spec)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn recreate_collection(
        &self,
        collection: &str,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.recreate(&collection, spec)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.exists(&collection)
                .await
                .map_err(|e| VectorStoreError::Collection(e.to_string()))
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let points = points
                .into_iter()
                .map(to_point_struct)
                .collect::<Result<Vec<_>, _>>()?;
            self.client
                .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
                .await
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
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
            let results = self
                .search_points(&collection, vector, limit, filter.map(to_qdrant_filter))
                .await
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            Ok(results.into_iter().map(from_scored_point).collect())
        })
    }
}

fn to_point_struct(point: VectorPoint) -> Result<PointStruct, VectorStoreError> {
    let payload: HashMap<String, qdrant_client::qdrant::Value> =
        serde_json::from_value(serde_json::Value::Object(point.payload.into_iter().collect()))
            .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
    Ok(PointStruct::new(point.id, point.vector, payload))
}

fn to_qdrant_filter(filter: VectorFilter) -> Filter {
    Filter::must(
        filter
            .must
            .into_iter()
            .map(|c| Condition::matches(c.field, c.value)),
    )
}

fn to_json(value: qdrant_client::qdrant::Value) -> Option<serde_json::Value> {
    Some(match value.kind? {
        Kind::NullValue(_) => serde_json::Value::Null,
        Kind::BoolValue(b) => serde_json::Value::Bool(b),
        Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
        Kind::DoubleValue(d) => serde_json::Number::from_f64(d).map(serde_json::Value::Number)?,
        Kind::StringValue(s) => serde_json::Value::String(s),
        Kind::ListValue(list) => {
            serde_json::Value::Array(list.values.into_iter().filter_map(to_json).collect())
        }
        Kind::StructValue(s) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .filter_map(|(k, v)| Some((k, to_json(v)?)))
                .collect(),
        ),
    })
}

fn from_scored_point(point: ScoredPoint) -> ScoredVectorPoint {
    let payload = point
        .payload
        .into_iter()
        .filter_map(|(k, v)| Some((k, to_json(v)?)))
        .collect();

    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };

    ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    }
}
