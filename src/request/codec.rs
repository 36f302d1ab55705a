//! Task payload encoding.
//!
//! Requests handed to task workers cross a process boundary, so they travel
//! as JSON bytes rather than as in-memory values.

use thiserror::Error;

use crate::request::canonical::CanonicalRequest;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode task payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode task payload: {0}")]
    Decode(#[source] serde_json::Error),
}

impl CanonicalRequest {
    /// Serialize for the task queue.
    pub fn to_task_payload(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }

    /// Rebuild a request received by a task worker.
    pub fn from_task_payload(data: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(data).map_err(CodecError::Decode)
    }
}
