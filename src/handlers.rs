use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use std::sync::Arc;

use crate::models::{ErrorResponse, MergeRequest};
use crate::state::AppState;
use crate::store::StoreError;
use crate::utils::sanitize_filename;

// pull a required header out as a str
fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &str,
) -> Result<&'a str, (StatusCode, Json<ErrorResponse>)> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Chunk request missing '{}' header", name);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Missing or invalid '{}' header", name),
                }),
            )
        })
}

// parse a header that must be a non-negative integer
fn header_usize(
    headers: &HeaderMap,
    name: &str,
) -> Result<usize, (StatusCode, Json<ErrorResponse>)> {
    header_str(headers, name)?.parse::<usize>().map_err(|_| {
        tracing::warn!("Chunk request has non-numeric '{}' header", name);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("'{}' header must be a non-negative integer", name),
            }),
        )
    })
}

/// receive one chunk: identity and addressing in the `filename`,
/// `chunkindex` and `totalchunks` headers, raw chunk bytes as the body
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    let filename = sanitize_filename(header_str(&headers, "filename")?);
    let chunk_index = header_usize(&headers, "chunkindex")?;
    let total_chunks = header_usize(&headers, "totalchunks")?;

    if filename.is_empty() {
        tracing::warn!("Chunk request with empty filename after sanitizing");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid filename".to_string(),
            }),
        ));
    }

    // stored indices must stay a subset of [0, totalchunks)
    if chunk_index >= total_chunks {
        tracing::warn!(
            "Chunk index {} out of range for {} (total {})",
            chunk_index,
            filename,
            total_chunks
        );
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!(
                    "chunkindex {} out of range for totalchunks {}",
                    chunk_index, total_chunks
                ),
            }),
        ));
    }

    // an empty payload is only legal for a zero-byte tail chunk
    if body.is_empty() && chunk_index + 1 != total_chunks {
        tracing::warn!("Empty payload for non-final chunk {} of {}", chunk_index, filename);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Empty chunk payload".to_string(),
            }),
        ));
    }

    state.store.put(&filename, chunk_index, &body).await.map_err(|e| {
        tracing::error!("Failed to store chunk {} of {}: {}", chunk_index, filename, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to store chunk: {}", e),
            }),
        )
    })?;

    tracing::debug!(
        "📦 Received chunk {}/{} of {} ({} bytes)",
        chunk_index + 1,
        total_chunks,
        filename,
        body.len()
    );

    Ok("Chunk received".to_string())
}

/// merge all chunks of an upload, in index order, into the final file
pub async fn merge_chunks(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MergeRequest>,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    let filename = sanitize_filename(&payload.filename);

    if filename.is_empty() {
        tracing::warn!("Merge request with empty filename after sanitizing");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid filename".to_string(),
            }),
        ));
    }

    tracing::debug!("Merging {} chunks of {}", payload.total_chunks, filename);

    state
        .store
        .assemble(&filename, payload.total_chunks)
        .await
        .map_err(|e| {
            tracing::error!("Failed to assemble {}: {}", filename, e);
            let status = match e {
                StoreError::MissingChunk { .. } => StatusCode::NOT_FOUND,
                StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorResponse {
                    error: format!("Failed to assemble file: {}", e),
                }),
            )
        })?;

    Ok("File assembled".to_string())
}

/// liveness/info endpoint
pub async fn server_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "File upload server is running",
        "service": "chunkdrop",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
