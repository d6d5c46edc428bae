use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::SpooledTempFile;
use uuid::Uuid;

/// Process-wide counters of staging allocations and releases.
#[derive(Debug, Default)]
pub struct StagingTracker {
    allocated: AtomicU64,
    released: AtomicU64,
}

impl StagingTracker {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn allocated(&self) -> u64 {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Staging resources currently alive.
    pub fn outstanding(&self) -> u64 {
        self.allocated().saturating_sub(self.released())
    }

    fn record_allocation(&self) {
        self.allocated.fetch_add(1, Ordering::SeqCst);
    }

    fn record_release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Exclusively owned buffer holding one request body.
///
/// Bytes stay in memory up to the configured threshold and overflow to an
/// anonymous temporary file past it. The resource is released when it is
/// dropped, so every exit path from the owning scope (success, `?`, panic
/// unwind, a cancelled future) reclaims the backing storage exactly once.
///
/// There is no public `Read` impl: content is only readable through a
/// [`VerifiedUpload`](super::verifier::VerifiedUpload), which guarantees the
/// cursor was rewound after measurement.
pub struct StagingResource {
    id: Uuid,
    file: Option<SpooledTempFile>,
    memory_threshold: usize,
    written: u64,
    tracker: Arc<StagingTracker>,
}

impl StagingResource {
    pub fn allocate(memory_threshold: usize, tracker: Arc<StagingTracker>) -> Self {
        tracker.record_allocation();
        let id = Uuid::new_v4();
        tracing::debug!("Allocated staging resource {}", id);

        Self {
            id,
            file: Some(SpooledTempFile::new(memory_threshold)),
            memory_threshold,
            written: 0,
            tracker,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True once the content has overflowed from memory to disk.
    pub fn is_on_disk(&self) -> bool {
        self.file.as_ref().is_some_and(|f| f.is_rolled())
    }

    /// Whether writing `additional` more bytes keeps the buffer in memory,
    /// meaning the write cannot block on disk I/O.
    pub fn fits_in_memory(&self, additional: usize) -> bool {
        !self.is_on_disk()
            && self.written.saturating_add(additional as u64) <= self.memory_threshold as u64
    }

    /// Releases the resource now instead of at scope exit.
    pub fn release(self) {
        drop(self);
    }

    fn file_mut(&mut self) -> io::Result<&mut SpooledTempFile> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("staging resource already released"))
    }

    pub(super) fn read_content(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }
}

impl Write for StagingResource {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file_mut()?.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file_mut()?.flush()
    }
}

impl Seek for StagingResource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file_mut()?.seek(pos)
    }
}

impl Drop for StagingResource {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let on_disk = file.is_rolled();
            drop(file);
            self.tracker.record_release();
            tracing::debug!(
                "Released staging resource {} (on_disk={})",
                self.id,
                on_disk
            );
        }
    }
}

impl std::fmt::Debug for StagingResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingResource")
            .field("id", &self.id)
            .field("written", &self.written)
            .field("on_disk", &self.is_on_disk())
            .finish()
    }
}
