use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use arxrag_memory::cosine_similarity;

use super::server::AppState;

/// Anchor, paraphrase of the anchor, unrelated sentence sharing surface words.
pub(crate) const PROBES: [&str; 3] = [
    "Пес ходила на лужайке",
    "Собака бегала на газоне",
    "Василий бухал на лужайке",
];

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

#[derive(Serialize)]
struct ProbeResponse {
    status: &'static str,
    model: String,
    paraphrase_similarity: f32,
    unrelated_similarity: f32,
}

#[derive(Deserialize)]
pub(crate) struct EmbedRequest {
    pub text: String,
}

#[derive(Serialize)]
struct EmbedResponse {
    dimensions: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

pub(crate) async fn root_handler() -> impl IntoResponse {
    Json(StatusResponse { status: "ok" })
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub(crate) async fn probe_handler(State(state): State<AppState>) -> Response {
    let mut vectors = Vec::with_capacity(PROBES.len());
    for text in PROBES {
        match state.embedder.embed(text).await {
            Ok(v) => vectors.push(v),
            Err(e) => {
                tracing::warn!("probe embedding failed: {e}");
                return error(StatusCode::BAD_GATEWAY, e.to_string());
            }
        }
    }

    let paraphrase_similarity = cosine_similarity(&vectors[0], &vectors[1]);
    let unrelated_similarity = cosine_similarity(&vectors[0], &vectors[2]);
    tracing::info!(paraphrase_similarity, unrelated_similarity, "embedding probe");

    Json(ProbeResponse {
        status: "ok",
        model: state.embedder.model().to_owned(),
        paraphrase_similarity,
        unrelated_similarity,
    })
    .into_response()
}

pub(crate) async fn embed_handler(
    State(state): State<AppState>,
    Json(request): Json<EmbedRequest>,
) -> Response {
    if request.text.trim().is_empty() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "text must not be empty");
    }
    match state.embedder.embed(&request.text).await {
        Ok(embedding) => Json(EmbedResponse {
            dimensions: embedding.len(),
            embedding,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!("embedding failed: {e}");
            error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
