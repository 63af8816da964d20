use std::future::Future;
use std::pin::Pin;

use ollama_rs::Ollama;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("invalid embedding endpoint {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("embedding response was empty")]
    EmptyResponse,
    #[error("expected {expected} embeddings, got {actual}")]
    BatchSize { expected: usize, actual: usize },
}

pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>>;
pub type EmbedBatchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EmbedError>> + Send + 'a>>;

/// Text to dense vector. Object safe so pipelines can hold `Arc<dyn Embedder>`.
pub trait Embedder: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;

    /// One vector per input, in input order. Defaults to one `embed` call per text.
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedBatchFuture<'a> {
        Box::pin(async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for &text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        })
    }

    fn model(&self) -> &str;
}

/// [`Embedder`] backed by an Ollama server's `/api/embed` endpoint.
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
}

impl std::fmt::Debug for OllamaEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEmbedder")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OllamaEmbedder {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self, EmbedError> {
        let client = Ollama::try_new(base_url).map_err(|e| EmbedError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            model: model.into(),
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move {
            let request =
                GenerateEmbeddingsRequest::new(self.model.clone(), EmbeddingsInput::from(text));
            let response = self
                .client
                .generate_embeddings(request)
                .await
                .map_err(|e| EmbedError::Request(format!("Ollama embedding request failed: {e}")))?;

            response
                .embeddings
                .into_iter()
                .next()
                .filter(|v| !v.is_empty())
                .ok_or(EmbedError::EmptyResponse)
        })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedBatchFuture<'a> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let input = texts.iter().map(|t| (*t).to_owned()).collect();
            let request =
                GenerateEmbeddingsRequest::new(self.model.clone(), EmbeddingsInput::Multiple(input));
            let response = self
                .client
                .generate_embeddings(request)
                .await
                .map_err(|e| EmbedError::Request(format!("Ollama embedding request failed: {e}")))?;

            if response.embeddings.len() != texts.len() {
                return Err(EmbedError::BatchSize {
                    expected: texts.len(),
                    actual: response.embeddings.len(),
                });
            }
            if response.embeddings.iter().any(Vec::is_empty) {
                return Err(EmbedError::EmptyResponse);
            }
            Ok(response.embeddings)
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Cosine of the angle between two vectors; 0.0 if either has zero norm.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[], &[]).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_url_rejected() {
        let err = OllamaEmbedder::new("not a url", "bge-m3").unwrap_err();
        assert!(matches!(err, EmbedError::InvalidUrl { .. }));
    }

    #[test]
    fn debug_hides_client() {
        let e = OllamaEmbedder::new("http://localhost:11434", "bge-m3").unwrap();
        let dbg = format!("{e:?}");
        assert!(dbg.contains("bge-m3"));
        assert_eq!(e.model(), "bge-m3");
    }

    #[tokio::test]
    async fn embed_returns_first_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({"model": "bge-m3", "input": "hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[0.1, 0.2, 0.3]]})),
            )
            .mount(&server)
            .await;

        let e = OllamaEmbedder::new(&server.uri(), "bge-m3").unwrap();
        let v = e.embed("hello").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn batch_is_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(
                serde_json::json!({"model": "bge-m3", "input": ["a", "b"]}),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embeddings": [[1.0, 0.0], [0.0, 1.0]]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let e = OllamaEmbedder::new(&server.uri(), "bge-m3").unwrap();
        let v = e.embed_batch(&["a", "b"]).await.unwrap();
        assert_eq!(v, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn short_batch_response_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embeddings": [[1.0]]})),
            )
            .mount(&server)
            .await;

        let e = OllamaEmbedder::new(&server.uri(), "bge-m3").unwrap();
        assert!(matches!(
            e.embed_batch(&["a", "b"]).await,
            Err(EmbedError::BatchSize { expected: 2, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn empty_batch_skips_request() {
        let e = OllamaEmbedder::new("http://127.0.0.1:1", "bge-m3").unwrap();
        assert!(e.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_embeddings_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embeddings": []})),
            )
            .mount(&server)
            .await;

        let e = OllamaEmbedder::new(&server.uri(), "bge-m3").unwrap();
        assert!(matches!(e.embed("x").await, Err(EmbedError::EmptyResponse)));
    }

    #[tokio::test]
    async fn server_error_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
            .mount(&server)
            .await;

        let e = OllamaEmbedder::new(&server.uri(), "missing").unwrap();
        match e.embed("x").await {
            Err(EmbedError::Request(msg)) => assert!(msg.contains("model not found")),
            other => panic!("expected request error, got {other:?}"),
        }
    }
}
