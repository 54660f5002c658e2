use thiserror::Error;

#[derive(Error, Debug)]
pub enum TownError {
    #[error("Unrecoverable syntax: {0}")]
    UnrecoverableSyntax(String),

    #[error("Town document has no name")]
    EmptyName,

    #[error("No saved town named '{0}'")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TownError>;
