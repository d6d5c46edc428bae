use super::error::IngestError;
use super::staging::StagingResource;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io::Write;

/// Drains a request body stream into a staging resource.
///
/// Chunks that still fit in the in-memory buffer are written inline; anything
/// that may touch disk is written on the blocking pool. The resource moves
/// into the blocking task and back, so if this future is dropped mid-transfer
/// the resource is still released exactly once, wherever it currently lives.
pub async fn spool_stream<S, E>(
    mut resource: StagingResource,
    stream: S,
) -> Result<StagingResource, IngestError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| IngestError::BodyRead(e.to_string()))?;
        if chunk.is_empty() {
            continue;
        }

        if resource.fits_in_memory(chunk.len()) {
            resource.write_all(&chunk)?;
        } else {
            resource = tokio::task::spawn_blocking(move || {
                resource.write_all(&chunk)?;
                Ok::<_, std::io::Error>(resource)
            })
            .await
            .map_err(|e| {
                IngestError::Staging(std::io::Error::other(format!(
                    "spawn_blocking failed: {e}"
                )))
            })??;
        }
    }

    resource.flush()?;
    Ok(resource)
}
