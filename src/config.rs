use std::path::PathBuf;

/// application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// staging directory for chunk files and assembled output
    pub staging_dir: PathBuf,
    /// server bind address
    pub host: String,
    /// server port
    pub port: u16,
    /// maximum accepted chunk payload in bytes
    pub max_chunk_size: usize,
    /// number of tokio worker threads
    pub worker_threads: usize,
}

impl Config {
    /// load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            staging_dir: std::env::var("STAGING_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
            host: std::env::var("HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            max_chunk_size: std::env::var("MAX_CHUNK_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(512 * 1024 * 1024), // 512MB default, above the sender's 400MB chunks
            worker_threads: std::env::var("WORKER_THREADS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(8),
        }
    }
}
