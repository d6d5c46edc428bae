//! Bounded-size upload ingestion.
//!
//! A request passes through two size checks that share one predicate
//! ([`SizeLimit::check`]):
//!
//! 1. the declared-size guard, a cheap heuristic on `Content-Length` that runs
//!    before any body bytes are staged;
//! 2. the staged-size verifier, which measures the fully spooled body and is
//!    authoritative.
//!
//! The staging resource is released on every exit path once it exists.

pub mod error;
pub mod guard;
pub mod limit;
pub mod spool;
pub mod staging;
pub mod verifier;

pub use error::{IngestError, SizeCheckStage};
pub use guard::{DeclaredSize, check_declared_size};
pub use limit::SizeLimit;
pub use staging::{StagingResource, StagingTracker};
pub use verifier::{VerifiedUpload, measure, verify_blocking};

use crate::config::UploadConfig;
use bytes::Bytes;
use futures::Stream;
use std::sync::Arc;
use uuid::Uuid;

/// How the request body wraps the uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// The body is the file itself.
    Raw,
    /// The file is one part of a `multipart/form-data` envelope.
    Multipart,
}

/// Result of a completed ingestion, after the staging resource was released.
#[derive(Debug)]
pub struct IngestOutcome<T> {
    pub upload_id: Uuid,
    pub size: u64,
    pub staged_on_disk: bool,
    pub value: T,
}

#[derive(Debug, Clone)]
pub struct IngestService {
    limit: SizeLimit,
    memory_threshold: usize,
    envelope_allowance: u64,
    tracker: Arc<StagingTracker>,
}

impl IngestService {
    pub fn new(config: &UploadConfig) -> Self {
        Self::with_tracker(config, StagingTracker::shared())
    }

    pub fn with_tracker(config: &UploadConfig, tracker: Arc<StagingTracker>) -> Self {
        Self {
            limit: SizeLimit::from(config.max_upload_size),
            memory_threshold: config.spool_memory_threshold,
            envelope_allowance: config.multipart_envelope_allowance as u64,
            tracker,
        }
    }

    pub fn tracker(&self) -> &Arc<StagingTracker> {
        &self.tracker
    }

    /// Declared-size guard. Performs no I/O and allocates nothing.
    pub fn guard(
        &self,
        declared: &DeclaredSize,
        encoding: BodyEncoding,
    ) -> Result<(), IngestError> {
        let limit = match encoding {
            BodyEncoding::Raw => self.limit,
            BodyEncoding::Multipart => self.limit.with_allowance(self.envelope_allowance),
        };
        check_declared_size(declared, limit)
    }

    pub fn allocate(&self) -> StagingResource {
        StagingResource::allocate(self.memory_threshold, self.tracker.clone())
    }

    /// Allocates a staging resource and spools the whole body into it.
    pub async fn stage<S, E>(&self, body: S) -> Result<StagingResource, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        spool::spool_stream(self.allocate(), body).await
    }

    /// Staged-size verifier, run on the blocking pool.
    pub async fn verify(&self, resource: StagingResource) -> Result<VerifiedUpload, IngestError> {
        let limit = self.limit;
        tokio::task::spawn_blocking(move || verify_blocking(resource, limit))
            .await
            .map_err(|e| {
                IngestError::Staging(std::io::Error::other(format!(
                    "spawn_blocking failed: {e}"
                )))
            })?
    }

    /// Stages, verifies and hands the upload to `consume`, then releases it.
    ///
    /// `consume` runs on the blocking pool and sees the content from byte 0.
    /// The staging resource is released before this returns, whichever step
    /// fails.
    pub async fn ingest<S, E, F, T>(
        &self,
        body: S,
        consume: F,
    ) -> Result<IngestOutcome<T>, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
        F: FnOnce(&mut VerifiedUpload) -> std::io::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let staged = self.stage(body).await?;
        let verified = self.verify(staged).await?;

        tokio::task::spawn_blocking(move || {
            let mut verified = verified;
            let value = consume(&mut verified)?;
            let outcome = IngestOutcome {
                upload_id: verified.id(),
                size: verified.size(),
                staged_on_disk: verified.staged_on_disk(),
                value,
            };
            verified.release();
            Ok::<_, IngestError>(outcome)
        })
        .await
        .map_err(|e| {
            IngestError::Staging(std::io::Error::other(format!(
                "spawn_blocking failed: {e}"
            )))
        })?
    }
}
