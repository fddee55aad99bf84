use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Fabric(#[from] txlink_fabric::Error),

    #[error("Frame error: {0}")]
    Frame(#[from] txlink_core::Error),

    #[error("Correlation key already registered: {0}")]
    DuplicateKey(String),

    #[error("Not connected to the transaction manager")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, Error>;
