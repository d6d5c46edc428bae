use super::error::{IngestError, SizeCheckStage};
use super::limit::SizeLimit;
use axum::http::{HeaderMap, HeaderValue, header};

/// Size a client claims for its payload. Never trusted, only used to shed
/// obviously oversized requests before any body bytes are staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredSize {
    Absent,
    /// Header present but not a non-negative integer.
    Invalid(String),
    Bytes(u64),
}

impl DeclaredSize {
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        let Some(value) = value else {
            return DeclaredSize::Absent;
        };

        let raw = String::from_utf8_lossy(value.as_bytes());
        let digits = raw.trim();
        match digits.parse::<u64>() {
            Ok(n) => DeclaredSize::Bytes(n),
            // A well-formed count too large for u64 is over any limit.
            Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                DeclaredSize::Bytes(u64::MAX)
            }
            Err(_) => DeclaredSize::Invalid(raw.into_owned()),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_header(headers.get(header::CONTENT_LENGTH))
    }

    pub fn bytes(&self) -> Option<u64> {
        match self {
            DeclaredSize::Bytes(n) => Some(*n),
            _ => None,
        }
    }
}

/// Fail fast when the declared size exceeds the limit.
///
/// Absent or unparseable metadata is not an error; the request proceeds and
/// the staged-size check decides.
pub fn check_declared_size(
    declared: &DeclaredSize,
    limit: SizeLimit,
) -> Result<(), IngestError> {
    match declared {
        DeclaredSize::Bytes(n) => limit.check(*n, SizeCheckStage::Declared),
        DeclaredSize::Invalid(raw) => {
            tracing::debug!("Ignoring unparseable Content-Length header: {:?}", raw);
            Ok(())
        }
        DeclaredSize::Absent => Ok(()),
    }
}
