use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use std::sync::Arc;

use chunkdrop::handlers::{merge_chunks, server_info, upload_chunk};
use chunkdrop::models::MergeRequest;
use chunkdrop::state::AppState;

fn chunk_headers(filename: &str, index: usize, total: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("filename", filename.parse().unwrap());
    headers.insert("chunkindex", index.to_string().parse().unwrap());
    headers.insert("totalchunks", total.to_string().parse().unwrap());
    headers
}

#[tokio::test]
async fn test_server_info() {
    let response = server_info().await;
    assert_eq!(response.0["message"], "File upload server is running");
    assert_eq!(response.0["service"], "chunkdrop");
}

#[tokio::test]
async fn test_upload_chunk_stores_bytes() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    let headers = chunk_headers("clip.mp4", 0, 2);
    let ack = upload_chunk(State(state.clone()), headers, Bytes::from_static(b"chunk zero"))
        .await
        .unwrap();
    assert_eq!(ack, "Chunk received");

    let stored = state.store.get("clip.mp4", 0).await.unwrap();
    assert_eq!(stored, b"chunk zero");
}

#[tokio::test]
async fn test_upload_chunk_missing_headers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    // no headers at all
    let result = upload_chunk(State(state.clone()), HeaderMap::new(), Bytes::from_static(b"x")).await;
    assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);

    // chunkindex not numeric
    let mut headers = HeaderMap::new();
    headers.insert("filename", "a.bin".parse().unwrap());
    headers.insert("chunkindex", "zero".parse().unwrap());
    headers.insert("totalchunks", "2".parse().unwrap());
    let result = upload_chunk(State(state), headers, Bytes::from_static(b"x")).await;
    assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_chunk_index_out_of_range() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    let headers = chunk_headers("a.bin", 5, 5);
    let result = upload_chunk(State(state), headers, Bytes::from_static(b"x")).await;
    assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_chunk_empty_payload_rules() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    // empty non-final chunk is rejected
    let headers = chunk_headers("a.bin", 0, 3);
    let result = upload_chunk(State(state.clone()), headers, Bytes::new()).await;
    assert_eq!(result.unwrap_err().0, StatusCode::BAD_REQUEST);

    // empty final chunk is accepted (zero-byte tail)
    let headers = chunk_headers("a.bin", 2, 3);
    upload_chunk(State(state.clone()), headers, Bytes::new())
        .await
        .unwrap();
    assert!(state.store.contains("a.bin", 2).await);
}

#[tokio::test]
async fn test_upload_chunk_sanitizes_filename() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    let headers = chunk_headers("../../escape.bin", 0, 1);
    upload_chunk(State(state.clone()), headers, Bytes::from_static(b"x"))
        .await
        .unwrap();

    // stored under the sanitized name inside the staging dir
    assert!(state.store.contains("escape.bin", 0).await);
    assert!(temp_dir.path().join("escape.bin.part0").exists());
}

#[tokio::test]
async fn test_merge_chunks_assembles_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    state.store.put("out.txt", 0, b"foo").await.unwrap();
    state.store.put("out.txt", 1, b"bar").await.unwrap();

    let payload = MergeRequest {
        filename: "out.txt".to_string(),
        total_chunks: 2,
    };
    let ack = merge_chunks(State(state.clone()), Json(payload)).await.unwrap();
    assert_eq!(ack, "File assembled");

    let merged = std::fs::read(temp_dir.path().join("out.txt")).unwrap();
    assert_eq!(&merged, b"foobar");

    // intermediate chunks are gone
    assert!(!state.store.contains("out.txt", 0).await);
    assert!(!state.store.contains("out.txt", 1).await);
}

#[tokio::test]
async fn test_merge_chunks_missing_chunk_is_not_found() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState::new(temp_dir.path().to_path_buf()));

    state.store.put("gap.txt", 0, b"only").await.unwrap();

    let payload = MergeRequest {
        filename: "gap.txt".to_string(),
        total_chunks: 2,
    };
    let err = merge_chunks(State(state), Json(payload)).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_merge_request_json_casing() {
    // the wire format uses camelCase totalChunks
    let payload: MergeRequest =
        serde_json::from_str(r#"{"filename":"a.bin","totalChunks":7}"#).unwrap();
    assert_eq!(payload.filename, "a.bin");
    assert_eq!(payload.total_chunks, 7);
}
