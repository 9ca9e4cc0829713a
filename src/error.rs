use std::path::PathBuf;

/// Errors raised outside the effects themselves
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot write preferences to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
