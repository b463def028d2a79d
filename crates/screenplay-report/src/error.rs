//! Report errors

/// Report model errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// JSON encoding or decoding failed
    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
