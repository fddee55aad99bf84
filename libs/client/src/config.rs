use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use txlink_fabric::codec::BincodeCodec;
use txlink_fabric::{IdleConfig, LinkConfig};

/// Client settings for the transaction manager link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Transaction manager address
    pub address: SocketAddr,
    /// How long `send_and_wait` waits for a reply
    pub delay: Duration,
    /// Serialization protocol id stamped on outbound frames
    pub serial_protocol: u8,
    pub connect_timeout: Option<Duration>,
    /// A frame that cannot be written within this window fails the link
    pub send_timeout: Option<Duration>,
    /// Fail the link when no frame arrives within this window
    pub receive_timeout: Option<Duration>,
    /// No inbound data for this long means the peer is gone
    pub reader_idle: Option<Duration>,
    /// No outbound data for this long sends a heartbeat
    pub writer_idle: Option<Duration>,
    pub all_idle: Option<Duration>,
    /// Connect attempts per reconnect
    pub retry_max: u32,
    pub retry_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from((Ipv4Addr::LOCALHOST, 9998)),
            delay: Duration::from_secs(3),
            serial_protocol: BincodeCodec::PROTOCOL_ID,
            connect_timeout: Some(Duration::from_secs(5)),
            send_timeout: Some(Duration::from_secs(10)),
            receive_timeout: None,
            reader_idle: Some(Duration::from_secs(30)),
            writer_idle: Some(Duration::from_secs(10)),
            all_idle: None,
            retry_max: 3,
            retry_interval: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Create a builder starting from the defaults
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Settings handed to each link the client opens
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            connect_timeout: self.connect_timeout,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
            idle: IdleConfig {
                reader_idle: self.reader_idle,
                writer_idle: self.writer_idle,
                all_idle: self.all_idle,
            },
        }
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the transaction manager address
    pub fn address(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// Set the reply timeout for `send_and_wait`
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Set the reply timeout in whole seconds
    pub fn delay_secs(self, secs: u64) -> Self {
        self.delay(Duration::from_secs(secs))
    }

    pub fn serial_protocol(mut self, id: u8) -> Self {
        self.config.serial_protocol = id;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    pub fn send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    pub fn receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.receive_timeout = timeout;
        self
    }

    /// Set the heartbeat cadence (writer idle window)
    pub fn heartbeat(mut self, every: Duration) -> Self {
        self.config.writer_idle = Some(every);
        self
    }

    pub fn reader_idle(mut self, window: Option<Duration>) -> Self {
        self.config.reader_idle = window;
        self
    }

    pub fn all_idle(mut self, window: Option<Duration>) -> Self {
        self.config.all_idle = window;
        self
    }

    pub fn retry(mut self, max: u32, interval: Duration) -> Self {
        self.config.retry_max = max;
        self.config.retry_interval = interval;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
