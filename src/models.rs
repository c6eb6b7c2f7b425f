use serde::{Deserialize, Serialize};

// request to merge all chunks of an upload into the final file
#[derive(Deserialize, Debug)]
pub struct MergeRequest {
    pub filename: String,
    #[serde(rename = "totalChunks")]
    pub total_chunks: usize,
}

// generic error response
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
