//! Error types for meshtopo.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid node address: {0}")]
    InvalidAddress(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
