use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::transport::framing::{bounded, read_frame, write_frame};
use crate::transport::Transport;

/// TCP transport with length-prefix framing
///
/// Messages are sent with a 4-byte big-endian length prefix
pub struct TcpTransport {
    stream: TcpStream,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Connect to a remote TCP address with no timeouts
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::builder().address(addr).connect().await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            send_timeout: None,
            receive_timeout: None,
        }
    }

    /// Get the remote address of this connection
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.stream.peer_addr().map_err(Into::into)
    }

    /// Get the local address of this connection
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.local_addr().map_err(Into::into)
    }

    /// Split into halves that can be driven from separate tasks
    ///
    /// Configured timeouts carry over to the matching half.
    pub fn into_split(self) -> (TcpReadHalf, TcpWriteHalf) {
        let (read, write) = self.stream.into_split();
        (
            TcpReadHalf {
                inner: read,
                receive_timeout: self.receive_timeout,
            },
            TcpWriteHalf {
                inner: write,
                send_timeout: self.send_timeout,
            },
        )
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        bounded(self.send_timeout, "Send", write_frame(&mut self.stream, bytes)).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        bounded(self.receive_timeout, "Receive", read_frame(&mut self.stream)).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Receiving half of a split [`TcpTransport`]
pub struct TcpReadHalf {
    inner: OwnedReadHalf,
    receive_timeout: Option<Duration>,
}

impl TcpReadHalf {
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        bounded(self.receive_timeout, "Receive", read_frame(&mut self.inner)).await
    }
}

/// Sending half of a split [`TcpTransport`]
pub struct TcpWriteHalf {
    inner: OwnedWriteHalf,
    send_timeout: Option<Duration>,
}

impl TcpWriteHalf {
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        bounded(self.send_timeout, "Send", write_frame(&mut self.inner, bytes)).await
    }

    /// Shut down the write direction, signalling EOF to the peer
    pub async fn close(&mut self) -> Result<()> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((TcpTransport::from_stream(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }
}

/// Builder for configuring TCP transport
#[derive(Default)]
pub struct TcpTransportBuilder {
    address: Option<SocketAddr>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl TcpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address to connect to
    pub fn address(mut self, addr: SocketAddr) -> Self {
        self.address = Some(addr);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the send timeout
    pub fn send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the receive timeout
    pub fn receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Connect with the configured settings
    pub async fn connect(self) -> Result<TcpTransport> {
        let addr = self.address.ok_or(Error::NoAddress)?;

        let stream = bounded(self.connect_timeout, "Connect", async {
            TcpStream::connect(addr).await.map_err(Error::from)
        })
        .await?;
        stream.set_nodelay(true)?;

        Ok(TcpTransport {
            stream,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
        })
    }
}
