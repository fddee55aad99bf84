use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use txlink_core::Frame;
use txlink_fabric::codec::{BincodeCodec, Codec};

use crate::config::ClientConfig;
use crate::connection::{Connection, ConnectionState};
use crate::connector::Connector;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::key::{IdWorker, KeyGenerator};
use crate::meta::MetaInfoProvider;
use crate::pending::Reply;
use crate::registry::Registry;
use crate::transport::FrameTransport;

/// Extra wait past the reply timeout before a caller stops trusting the timer
const TIMER_GRACE: Duration = Duration::from_secs(1);

/// Request/response client for the transaction manager
///
/// `send_and_wait` blocks the calling thread; call it from ordinary threads
/// or `spawn_blocking`, never from inside the runtime driving the link.
pub struct TxClient {
    connection: Arc<Connection>,
    registry: Arc<Registry>,
    keys: Arc<dyn KeyGenerator>,
    delay: Duration,
    serial_protocol: u8,
}

impl TxClient {
    /// Wire a client from its parts
    pub fn new(
        connection: Arc<Connection>,
        registry: Arc<Registry>,
        keys: Arc<dyn KeyGenerator>,
        delay: Duration,
        serial_protocol: u8,
    ) -> Self {
        Self {
            connection,
            registry,
            keys,
            delay,
            serial_protocol,
        }
    }

    /// Start a bincode client; connecting happens in the background on `runtime`
    pub fn start(config: ClientConfig, meta: Arc<dyn MetaInfoProvider>, runtime: Handle) -> Self {
        Self::start_with_codec(config, meta, runtime, BincodeCodec)
    }

    pub fn start_with_codec<C: Codec + Clone + 'static>(
        config: ClientConfig,
        meta: Arc<dyn MetaInfoProvider>,
        runtime: Handle,
        codec: C,
    ) -> Self {
        if config.serial_protocol != codec.protocol_id() {
            tracing::warn!(
                configured = config.serial_protocol,
                codec = codec.protocol_id(),
                "serial protocol does not match the codec in use"
            );
        }

        let registry = Arc::new(Registry::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry)));

        let connection = Arc::new_cyclic(|connection| {
            let connector = Connector::new(
                config.clone(),
                runtime,
                connection.clone(),
                dispatcher,
                codec,
            );
            Connection::new(Arc::new(connector), meta, config.serial_protocol)
        });
        connection.reconnect();

        Self::new(
            connection,
            registry,
            IdWorker::global(),
            config.delay,
            config.serial_protocol,
        )
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Trigger a reconnect, e.g. after the retry budget ran out
    pub fn reconnect(&self) {
        self.connection.reconnect();
    }

    /// Send `frame` and block until its reply or the timeout
    ///
    /// Returns `None` when not connected or the reply could not be produced.
    /// A timeout yields the action's fallback, see [`Reply::timeout_for`].
    pub fn send_and_wait(&self, mut frame: Frame) -> Option<Reply> {
        let transport = match self.usable_transport() {
            Ok(transport) => transport,
            Err(e) => {
                tracing::debug!(action = frame.action, error = %e, "call skipped");
                return None;
            }
        };

        let key = self.keys.next_key();
        let call = match self.registry.register(&key) {
            Ok(call) => call,
            Err(e) => {
                tracing::error!(%key, error = %e, "cannot register call");
                return None;
            }
        };
        let _registered = Deregister {
            registry: &self.registry,
            key: &key,
        };

        let action = frame.action_code();
        frame.key = Some(key.clone());
        frame.serial_protocol = self.serial_protocol;

        if let Err(e) = transport.send(&frame) {
            tracing::warn!(%key, action = frame.action, error = %e, "send failed");
            return None;
        }

        let timer = {
            let call = Arc::clone(&call);
            transport.schedule_once(
                self.delay,
                Box::new(move || {
                    if !call.is_resolved() && call.resolve_with(Reply::timeout_for(action)) {
                        tracing::debug!(key = call.key(), "call timed out");
                    }
                }),
            )
        };

        // The timer normally resolves the call; this bound only matters if
        // its runtime stopped before the timer could run
        if !call.await_resolution_for(self.delay.saturating_add(TIMER_GRACE)) {
            call.resolve_with(Reply::timeout_for(action));
        }
        if !timer.is_done() {
            timer.cancel();
        }

        call.take_reply()
    }

    /// Send `frame` without waiting for anything
    pub fn send_fire_and_forget(&self, mut frame: Frame) {
        let transport = match self.usable_transport() {
            Ok(transport) => transport,
            Err(e) => {
                tracing::debug!(action = frame.action, error = %e, "frame dropped");
                return;
            }
        };

        frame.serial_protocol = self.serial_protocol;
        if let Err(e) = transport.send(&frame) {
            tracing::warn!(action = frame.action, error = %e, "send failed");
        }
    }

    fn usable_transport(&self) -> Result<Arc<dyn FrameTransport>> {
        match self.connection.active() {
            Some(transport)
                if self.connection.state() == ConnectionState::Connected
                    && transport.is_connected() =>
            {
                Ok(transport)
            }
            _ => Err(Error::NotConnected),
        }
    }
}

/// Removes a registry entry on every exit path
struct Deregister<'a> {
    registry: &'a Registry,
    key: &'a str,
}

impl Drop for Deregister<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.key);
    }
}
