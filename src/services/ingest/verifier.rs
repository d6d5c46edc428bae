use super::error::{IngestError, SizeCheckStage};
use super::limit::SizeLimit;
use super::staging::StagingResource;
use std::io::{self, Read, Seek, SeekFrom};

/// Measures the exact byte count of a seekable resource.
///
/// Seeks to the end, reads the absolute position, then rewinds to byte 0.
/// Callers reading after this see the full content from the start. Calling it
/// again on an unmodified resource yields the same count.
pub fn measure<S: Seek>(resource: &mut S) -> io::Result<u64> {
    let size = resource.seek(SeekFrom::End(0))?;
    resource.rewind()?;
    Ok(size)
}

/// Staged upload whose size has been measured and accepted.
///
/// The cursor starts at byte 0. Dropping it releases the staging resource.
#[derive(Debug)]
pub struct VerifiedUpload {
    size: u64,
    on_disk: bool,
    resource: StagingResource,
}

impl VerifiedUpload {
    /// Authoritative byte count.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn id(&self) -> uuid::Uuid {
        self.resource.id()
    }

    /// Whether the body had overflowed to disk when it was measured.
    pub fn staged_on_disk(&self) -> bool {
        self.on_disk
    }

    /// Re-runs the measurement, leaving the cursor at 0.
    pub fn remeasure(&mut self) -> io::Result<u64> {
        measure(&mut self.resource)
    }

    pub fn release(self) {
        self.resource.release();
    }
}

impl Read for VerifiedUpload {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.resource.read_content(buf)
    }
}

/// Synchronous measure-and-validate step.
///
/// Blocks the calling thread for the seek/measure/rewind sequence. Async
/// callers should go through [`IngestService::verify`](super::IngestService::verify),
/// which runs this on the blocking pool. On any error the resource is dropped,
/// and therefore released, before the error is returned.
pub fn verify_blocking(
    mut resource: StagingResource,
    limit: SizeLimit,
) -> Result<VerifiedUpload, IngestError> {
    let size = measure(&mut resource)?;
    limit.check(size, SizeCheckStage::Measured)?;

    let on_disk = resource.is_on_disk();
    tracing::debug!(
        "Staged upload {} measured at {} bytes (on_disk={})",
        resource.id(),
        size,
        on_disk
    );

    Ok(VerifiedUpload {
        size,
        on_disk,
        resource,
    })
}
