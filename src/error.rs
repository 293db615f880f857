use std::io;

/// Errors surfaced by the library side of keypace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("passage data not found: {0}")]
    MissingPassages(String),
    #[error("no passages available for difficulty {0}")]
    EmptyDifficulty(crate::passage::Difficulty),
}

pub type Result<T> = std::result::Result<T, Error>;
