use crate::error::Result;

pub mod framing;
pub mod tcp;

pub use self::tcp::{
    TcpReadHalf, TcpTransport, TcpTransportBuilder, TcpTransportListener, TcpWriteHalf,
};

/// Transport trait for sending and receiving raw frames
///
/// Each transport instance represents a single connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive the next frame from the transport
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;
}
