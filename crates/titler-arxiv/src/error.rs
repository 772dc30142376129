use thiserror::Error;

use titler_core::TitlerError;

#[derive(Debug, Error)]
pub enum ArxivError {
    #[error("no arXiv ID in path: {0}")]
    NoMatch(String),

    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("page task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Core(#[from] TitlerError),
}

pub type Result<T> = std::result::Result<T, ArxivError>;
