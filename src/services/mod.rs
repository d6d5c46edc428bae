pub mod ingest;
pub mod log_summary;
