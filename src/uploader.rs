use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// chunk size used when the caller passes 0 (400MB, matching the server's
/// expected upload granularity)
pub const DEFAULT_CHUNK_SIZE: usize = 400 * 1024 * 1024;

/// total attempts per chunk before the upload is declared failed
pub const MAX_SEND_ATTEMPTS: u32 = 3;

/// errors surfaced by the upload driver
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("chunk {index} failed after {attempts} attempts")]
    Transmission { index: usize, attempts: u32 },
    #[error("merge rejected by server with status {status}")]
    MergeRejected { status: reqwest::StatusCode },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("i/o error reading source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("source path has no usable file name")]
    InvalidSource,
    #[error("no upload session started")]
    NoSession,
    #[error("upload is not paused or failed")]
    NotPaused,
}

/// driver lifecycle: `Idle → Uploading → {Paused, Completed, Failed}`,
/// with `Paused → Uploading` on resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading,
    Paused,
    Completed,
    Failed,
}

/// progress snapshot handed to the progress callback after each acknowledged
/// chunk and after the confirmed merge
#[derive(Debug, Clone, Copy)]
pub struct UploadProgress {
    pub chunks_sent: usize,
    pub total_chunks: usize,
    pub percent: u8,
}

/// one logical file transfer; all progress state lives here rather than in
/// globals, so independent uploads can run from separate driver values
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
    pub total_chunks: usize,
    /// next chunk to send; survives pause/resume within this driver's lifetime
    pub current_chunk: usize,
}

/// cooperative pause switch, cloneable into another task. the flag is only
/// checked between chunks, so an in-flight transmission finishes first.
#[derive(Debug, Clone)]
pub struct PauseHandle {
    paused: Arc<AtomicBool>,
}

impl PauseHandle {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// client-side state machine that slices a source file into fixed-size
/// chunks, transmits them sequentially with bounded retry, and requests
/// reassembly once every chunk has been acknowledged
pub struct ChunkUploader {
    client: reqwest::Client,
    server_url: String,
    chunk_size: usize,
    paused: Arc<AtomicBool>,
    state: UploadState,
    session: Option<UploadSession>,
    on_progress: Option<ProgressCallback>,
}

impl ChunkUploader {
    /// create a driver targeting `server_url`; a `chunk_size` of 0 selects
    /// [`DEFAULT_CHUNK_SIZE`]
    pub fn new(server_url: impl Into<String>, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            client: reqwest::Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            chunk_size,
            paused: Arc::new(AtomicBool::new(false)),
            state: UploadState::Idle,
            session: None,
            on_progress: None,
        }
    }

    /// install a progress callback
    pub fn with_progress(mut self, f: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// handle for pausing the driver from another task
    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle {
            paused: Arc::clone(&self.paused),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    /// start uploading `path` from chunk 0; returns the terminal (or paused)
    /// state reached by the drive loop
    pub async fn start(&mut self, path: impl AsRef<Path>) -> Result<UploadState, UploadError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or(UploadError::InvalidSource)?;

        let file_size = fs::metadata(path).await?.len();
        let total_chunks = file_size.div_ceil(self.chunk_size as u64) as usize;

        tracing::info!(
            "Starting upload of {} ({} bytes, {} chunks)",
            file_name,
            file_size,
            total_chunks
        );

        self.session = Some(UploadSession {
            file_path: path.to_path_buf(),
            file_name,
            file_size,
            total_chunks,
            current_chunk: 0,
        });
        self.paused.store(false, Ordering::SeqCst);
        self.state = UploadState::Uploading;
        self.run().await
    }

    /// resume a paused (or failed) upload from its recorded `current_chunk`.
    /// only `Paused → Uploading` and a re-attempt from a `Failed` position are
    /// legal; resuming a completed upload would re-issue the merge and
    /// truncate the already-assembled file server-side.
    pub async fn resume(&mut self) -> Result<UploadState, UploadError> {
        if self.session.is_none() {
            return Err(UploadError::NoSession);
        }
        if !matches!(self.state, UploadState::Paused | UploadState::Failed) {
            return Err(UploadError::NotPaused);
        }
        self.paused.store(false, Ordering::SeqCst);
        self.state = UploadState::Uploading;
        tracing::info!("Resuming upload");
        self.run().await
    }

    // the per-chunk drive loop; pause is only observed at the top of each
    // iteration
    async fn run(&mut self) -> Result<UploadState, UploadError> {
        let session = self.session.clone().ok_or(UploadError::NoSession)?;
        let mut file = match fs::File::open(&session.file_path).await {
            Ok(f) => f,
            Err(e) => {
                self.state = UploadState::Failed;
                return Err(e.into());
            }
        };

        let mut current = session.current_chunk;

        while current < session.total_chunks {
            if self.paused.load(Ordering::SeqCst) {
                self.state = UploadState::Paused;
                tracing::info!(
                    "⏸️  Upload paused at chunk {}/{}",
                    current,
                    session.total_chunks
                );
                return Ok(self.state);
            }

            let chunk = match read_slice(&mut file, current, self.chunk_size, session.file_size).await
            {
                Ok(c) => c,
                Err(e) => {
                    self.state = UploadState::Failed;
                    return Err(e.into());
                }
            };

            if let Err(e) = self.send_chunk(&session, current, chunk).await {
                // current_chunk stays at the failed index
                self.state = UploadState::Failed;
                return Err(e);
            }

            current += 1;
            if let Some(s) = self.session.as_mut() {
                s.current_chunk = current;
            }
            self.report_progress(current, session.total_chunks);
        }

        match self.request_merge(&session).await {
            Ok(()) => {
                self.state = UploadState::Completed;
                // 100% is only reported once the server has confirmed the merge
                self.report_complete(session.total_chunks);
                tracing::info!("✅ Upload of {} complete", session.file_name);
                Ok(self.state)
            }
            Err(e) => {
                self.state = UploadState::Failed;
                Err(e)
            }
        }
    }

    // transmit one chunk, retrying up to MAX_SEND_ATTEMPTS with no backoff
    async fn send_chunk(
        &self,
        session: &UploadSession,
        index: usize,
        chunk: Bytes,
    ) -> Result<(), UploadError> {
        let url = format!("{}/upload-chunk", self.server_url);

        for attempt in 1..=MAX_SEND_ATTEMPTS {
            let result = self
                .client
                .post(&url)
                .header("filename", &session.file_name)
                .header("chunkindex", index.to_string())
                .header("totalchunks", session.total_chunks.to_string())
                .body(chunk.clone())
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(
                        "Sent chunk {}/{} of {}",
                        index + 1,
                        session.total_chunks,
                        session.file_name
                    );
                    return Ok(());
                }
                Ok(resp) => tracing::warn!(
                    "⚠️  Chunk {} rejected with status {} (attempt {}/{})",
                    index,
                    resp.status(),
                    attempt,
                    MAX_SEND_ATTEMPTS
                ),
                Err(e) => tracing::warn!(
                    "⚠️  Chunk {} transmission failed: {} (attempt {}/{})",
                    index,
                    e,
                    attempt,
                    MAX_SEND_ATTEMPTS
                ),
            }
        }

        Err(UploadError::Transmission {
            index,
            attempts: MAX_SEND_ATTEMPTS,
        })
    }

    // ask the server to reassemble the chunks into the final file
    async fn request_merge(&self, session: &UploadSession) -> Result<(), UploadError> {
        let url = format!("{}/merge-chunks", self.server_url);
        tracing::debug!(
            "Requesting merge of {} chunks of {}",
            session.total_chunks,
            session.file_name
        );

        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "filename": session.file_name,
                "totalChunks": session.total_chunks,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UploadError::MergeRejected {
                status: resp.status(),
            });
        }
        Ok(())
    }

    // only called from the chunk loop, so total_chunks is always non-zero
    fn report_progress(&self, chunks_sent: usize, total_chunks: usize) {
        // final percent is withheld until the merge is confirmed
        let percent = ((chunks_sent * 100 / total_chunks) as u8).min(99);
        tracing::info!("Uploading... {}%", percent);
        if let Some(cb) = &self.on_progress {
            cb(UploadProgress {
                chunks_sent,
                total_chunks,
                percent,
            });
        }
    }

    fn report_complete(&self, total_chunks: usize) {
        if let Some(cb) = &self.on_progress {
            cb(UploadProgress {
                chunks_sent: total_chunks,
                total_chunks,
                percent: 100,
            });
        }
    }
}

// read the byte range [index*chunk_size, min(file_size, (index+1)*chunk_size))
async fn read_slice(
    file: &mut fs::File,
    index: usize,
    chunk_size: usize,
    file_size: u64,
) -> std::io::Result<Bytes> {
    let start = index as u64 * chunk_size as u64;
    let len = std::cmp::min(chunk_size as u64, file_size.saturating_sub(start)) as usize;

    file.seek(SeekFrom::Start(start)).await?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
