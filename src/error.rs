use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures at the durable-storage boundary.
/// The Mutation API catches all of these; they never reach UI callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("write rejected for key {key}")]
    WriteRejected { key: String },
    #[error("read rejected for key {key}")]
    ReadRejected { key: String },
}
