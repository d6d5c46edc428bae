use std::env;

/// Upload ingestion configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted log file size in bytes (default: 20 MB)
    pub max_upload_size: usize,

    /// Bytes kept in memory before a staged body overflows to disk (default: 1 MB)
    pub spool_memory_threshold: usize,

    /// Extra declared bytes tolerated on multipart requests for the form envelope (default: 64 KB)
    pub multipart_envelope_allowance: usize,

    /// Hard transport ceiling for request bodies; `None` leaves bodies unbounded
    /// so the staged-size check stays authoritative
    pub transport_body_ceiling: Option<usize>,

    /// Allowed CORS Origins (comma separated, empty means any)
    pub allowed_origins: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 20 * 1024 * 1024, // 20 MB
            spool_memory_threshold: 1024 * 1024, // 1 MB
            multipart_envelope_allowance: 64 * 1024, // 64 KB
            transport_body_ceiling: None,
            allowed_origins: Vec::new(),
        }
    }
}

impl UploadConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            spool_memory_threshold: env::var("SPOOL_MEMORY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.spool_memory_threshold),

            multipart_envelope_allowance: env::var("MULTIPART_ENVELOPE_ALLOWANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.multipart_envelope_allowance),

            transport_body_ceiling: env::var("TRANSPORT_BODY_CEILING")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(default.transport_body_ceiling),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (small spool, no transport ceiling)
    pub fn development() -> Self {
        Self {
            max_upload_size: 20 * 1024 * 1024,
            spool_memory_threshold: 64 * 1024,
            multipart_envelope_allowance: 64 * 1024,
            transport_body_ceiling: None,
            allowed_origins: Vec::new(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
