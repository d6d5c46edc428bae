use std::fmt;
use thiserror::Error;

/// Which check rejected an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheckStage {
    /// Heuristic check against the client supplied `Content-Length`.
    Declared,
    /// Authoritative check against the staged byte count.
    Measured,
}

impl fmt::Display for SizeCheckStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeCheckStage::Declared => write!(f, "declared"),
            SizeCheckStage::Measured => write!(f, "measured"),
        }
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{stage} size of {size} bytes exceeds the maximum allowed {limit} bytes")]
    PayloadTooLarge {
        size: u64,
        limit: u64,
        stage: SizeCheckStage,
    },

    #[error("staging failure: {0}")]
    Staging(#[from] std::io::Error),

    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl IngestError {
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, IngestError::PayloadTooLarge { .. })
    }
}
