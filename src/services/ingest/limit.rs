use super::error::{IngestError, SizeCheckStage};

/// Process-wide upload size limit in bytes.
///
/// Both the declared-size guard and the staged-size verifier go through
/// [`SizeLimit::check`], so the comparison lives in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit(u64);

impl SizeLimit {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Returns a limit widened by `extra` bytes, saturating at `u64::MAX`.
    pub const fn with_allowance(&self, extra: u64) -> Self {
        Self(self.0.saturating_add(extra))
    }

    /// A size equal to the limit passes; one byte more fails.
    pub fn check(&self, size: u64, stage: SizeCheckStage) -> Result<(), IngestError> {
        if size > self.0 {
            tracing::warn!(
                "Upload rejected at {} stage: {} bytes exceeds limit of {} bytes",
                stage,
                size,
                self.0
            );
            return Err(IngestError::PayloadTooLarge {
                size,
                limit: self.0,
                stage,
            });
        }
        Ok(())
    }
}

impl From<usize> for SizeLimit {
    fn from(bytes: usize) -> Self {
        Self(bytes as u64)
    }
}
