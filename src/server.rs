use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::handlers::{merge_chunks, server_info, upload_chunk};
use crate::state::AppState;
use crate::utils::shutdown_signal;

/// build the upload router
pub fn build_router(state: Arc<AppState>, config: &Config) -> Router {
    tracing::debug!(
        "Building router with max chunk size: {} bytes",
        config.max_chunk_size
    );

    // browser clients send chunk addressing in custom headers
    let cors = CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(server_info))
        .route("/upload-chunk", post(upload_chunk))
        .route("/merge-chunks", post(merge_chunks))
        .layer(RequestBodyLimitLayer::new(config.max_chunk_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// bind and serve until a shutdown signal arrives
pub async fn start_server(app: Router, addr: SocketAddr) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");

    tracing::debug!("Listener bound to {}", addr);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .tcp_nodelay(true);

    tracing::info!("Server running and ready to accept connections");
    if let Err(e) = server.await {
        tracing::error!("Server error: {}", e);
    }
}

/// print startup banner with server info
pub fn print_startup_banner(config: &Config) {
    tracing::info!("Chunkdrop starting...");
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("📡 UPLOAD SERVER: http://{}:{}", config.host, config.port);
    tracing::info!(
        "📁 Staging chunks in: {:?}",
        config
            .staging_dir
            .canonicalize()
            .unwrap_or(config.staging_dir.clone())
    );
    tracing::info!("📐 Max chunk size: {} bytes", config.max_chunk_size);
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
