use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chunkdrop::uploader::{ChunkUploader, DEFAULT_CHUNK_SIZE};

// upload one file to a chunkdrop server:
//   chunkdrop-send <path>
// server url and chunk size come from SERVER_URL / CHUNK_SIZE env vars
#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: chunkdrop-send <file>");
        std::process::exit(2);
    };

    let server_url = std::env::var("SERVER_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());
    let chunk_size = std::env::var("CHUNK_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CHUNK_SIZE);

    let mut uploader = ChunkUploader::new(server_url, chunk_size).with_progress(|p| {
        println!(
            "{}% ({}/{} chunks)",
            p.percent, p.chunks_sent, p.total_chunks
        );
    });

    match uploader.start(&path).await {
        Ok(state) => {
            tracing::info!("Upload finished in state {:?}", state);
        }
        Err(e) => {
            tracing::error!("Upload failed: {}", e);
            std::process::exit(1);
        }
    }
}
