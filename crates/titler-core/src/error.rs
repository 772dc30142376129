use thiserror::Error;

/// All errors that can occur in titler-core.
#[derive(Debug, Error)]
pub enum TitlerError {
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl From<arboard::Error> for TitlerError {
    fn from(err: arboard::Error) -> Self {
        Self::Clipboard(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TitlerError>;
