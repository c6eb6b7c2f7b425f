use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// errors surfaced by the chunk store and the reassembly loop
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("missing chunk {index} for {file_name}")]
    MissingChunk { file_name: String, index: usize },
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// durable staging area for in-flight chunks, addressed by file name and index.
///
/// chunk files live next to their assembled output as `{filename}.part{index}`;
/// received-chunk knowledge is derived purely from what exists on disk,
/// so the server stays stateless across requests.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    staging_dir: PathBuf,
}

impl ChunkStore {
    pub fn new(staging_dir: PathBuf) -> Self {
        Self { staging_dir }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// on-disk path for one chunk
    pub fn chunk_path(&self, file_name: &str, index: usize) -> PathBuf {
        self.staging_dir.join(format!("{}.part{}", file_name, index))
    }

    /// on-disk path for the assembled output
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.staging_dir.join(file_name)
    }

    /// write or overwrite a chunk unconditionally. repeated puts with the same
    /// bytes are indistinguishable from one; a re-put with different bytes is
    /// last-write-wins.
    pub async fn put(&self, file_name: &str, index: usize, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.chunk_path(file_name, index);
        let mut file = fs::File::create(&path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        tracing::trace!("Stored chunk at {:?} ({} bytes)", path, bytes.len());
        Ok(())
    }

    /// read a chunk back; `MissingChunk` if it was never received or has
    /// already been consumed by reassembly
    pub async fn get(&self, file_name: &str, index: usize) -> Result<Vec<u8>, StoreError> {
        let path = self.chunk_path(file_name, index);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::MissingChunk {
                file_name: file_name.to_string(),
                index,
            }),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// whether a chunk is currently present
    pub async fn contains(&self, file_name: &str, index: usize) -> bool {
        fs::try_exists(self.chunk_path(file_name, index))
            .await
            .unwrap_or(false)
    }

    /// best-effort chunk deletion; an absent chunk is a no-op and other
    /// failures are logged and swallowed
    pub async fn remove(&self, file_name: &str, index: usize) {
        let path = self.chunk_path(file_name, index);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove chunk {:?}: {}", path, e);
            }
        }
    }

    /// reassemble chunks `0..total_chunks` in strict index order into the
    /// final file, deleting each chunk only after its bytes were appended.
    ///
    /// aborts with `MissingChunk` if an index is absent; bytes appended up to
    /// that point remain in the output file, so a failed merge leaves a
    /// truncated artifact behind. returns the assembled size in bytes.
    pub async fn assemble(&self, file_name: &str, total_chunks: usize) -> Result<u64, StoreError> {
        let out_path = self.output_path(file_name);
        tracing::debug!("Assembling {} chunks into {:?}", total_chunks, out_path);

        let mut out = fs::File::create(&out_path).await?;
        let mut written: u64 = 0;

        for index in 0..total_chunks {
            let bytes = self.get(file_name, index).await?;
            out.write_all(&bytes).await?;
            written += bytes.len() as u64;
            // consumed only after the append succeeded
            self.remove(file_name, index).await;
            tracing::trace!("Appended chunk {}/{} of {}", index + 1, total_chunks, file_name);
        }

        out.sync_all().await?;
        tracing::info!("✅ Assembled {} ({} bytes)", file_name, written);
        Ok(written)
    }
}
