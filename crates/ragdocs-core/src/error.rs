use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Nothing to index: {0}")]
    Empty(String),

    /// The index was built with a different embedding model than the one
    /// used to embed the query, so their vector spaces are not comparable.
    #[error("Embedding model mismatch: index built with '{indexed}', query embedder is '{query}'")]
    ModelMismatch { indexed: String, query: String },

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
