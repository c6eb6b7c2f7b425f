use std::path::PathBuf;

use crate::store::ChunkStore;

/// shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: ChunkStore,
}

impl AppState {
    /// create app state with a chunk store rooted at the staging directory
    pub fn new(staging_dir: PathBuf) -> Self {
        Self {
            store: ChunkStore::new(staging_dir),
        }
    }
}
