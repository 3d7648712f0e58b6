use thiserror::Error;

/// Errors that abort a migration run. Per-document and per-flush problems are
/// routed through the error sink instead and never surface here unless the
/// fail-fast flush policy is enabled.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index {index} has no usable shard/replica settings")]
    MissingSettings { index: String },

    #[error("failed resolving index metadata: {0}")]
    Resolve(String),

    #[error("provisioning failed for index {index}: {body}")]
    Provisioning { index: String, body: String },

    #[error("initial scroll request failed: {0}")]
    ScrollOpen(String),

    #[error("bulk write rejected by destination: {0}")]
    BulkRejected(String),

    #[error("writer pool failed: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, MigrateError>;
