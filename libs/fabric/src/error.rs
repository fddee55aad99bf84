use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    /// The peer closed the connection, or the link was already torn down
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("{0} timeout exceeded")]
    Timeout(&'static str),

    #[error("No address configured")]
    NoAddress,
}

impl Error {
    /// Whether this error ends the connection quietly rather than as a fault
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
