//! Connection state machine for the transaction manager link.
//!
//! Owns the active transport handle and reacts to link lifecycle and idle
//! events:
//!
//! ```text
//!                 begin_connect               on_active
//! Disconnected ────────────────> Connecting ─────────────> Connected
//!      ^                                                    │    │
//!      │ on_inactive (reconnect triggered)                  │    │ reader/all idle
//!      └────────────────────────────────────────────────────┘    v
//!                                   Connected <──────────── Reconnecting
//!                                             on_active
//! ```
//!
//! Writer idle sends a heartbeat and leaves the state alone. The handle is
//! replaced wholesale on reconnect; callers take a clone of the `Arc` and
//! use that, so a concurrent swap never hands them a half torn down link.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use txlink_core::Frame;
use txlink_fabric::IdleState;

use crate::meta::MetaInfoProvider;
use crate::transport::FrameTransport;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Re-establishes the link; the retry policy lives behind this trait
///
/// Called from link event tasks, so implementations must return promptly
/// and do the actual connecting elsewhere.
pub trait Reconnect: Send + Sync {
    fn reconnect(&self);
}

pub struct Connection {
    state: Mutex<ConnectionState>,
    active: RwLock<Option<Arc<dyn FrameTransport>>>,
    live: AtomicBool,
    reconnector: Arc<dyn Reconnect>,
    meta: Arc<dyn MetaInfoProvider>,
    serial_protocol: u8,
}

impl Connection {
    pub fn new(
        reconnector: Arc<dyn Reconnect>,
        meta: Arc<dyn MetaInfoProvider>,
        serial_protocol: u8,
    ) -> Self {
        Self {
            state: Mutex::new(ConnectionState::Disconnected),
            active: RwLock::new(None),
            live: AtomicBool::new(false),
            reconnector,
            meta,
            serial_protocol,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Best-effort liveness: set by any inbound traffic, cleared on disconnect
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn mark_live(&self) {
        self.live.store(true, Ordering::Release);
    }

    /// Snapshot of the current handle
    pub fn active(&self) -> Option<Arc<dyn FrameTransport>> {
        self.active.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
            && self.active().is_some_and(|t| t.is_connected())
    }

    /// Ask the lifecycle manager for a fresh link
    pub fn reconnect(&self) {
        self.reconnector.reconnect();
    }

    /// A connect attempt is starting
    pub fn begin_connect(&self) -> ConnectionState {
        let mut state = self.state.lock();
        *state = match *state {
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                ConnectionState::Connecting
            }
            ConnectionState::Connected | ConnectionState::Reconnecting => {
                ConnectionState::Reconnecting
            }
        };
        *state
    }

    /// Every connect attempt failed
    pub fn give_up(&self) {
        *self.state.lock() = ConnectionState::Disconnected;
    }

    pub fn on_active(&self, transport: Arc<dyn FrameTransport>) {
        let link = transport.id();
        *self.active.write() = Some(transport);
        self.live.store(true, Ordering::Release);
        *self.state.lock() = ConnectionState::Connected;
        tracing::info!(link, "link to transaction manager established");
    }

    /// The link `link` closed; ignored unless it is the current one
    pub fn on_inactive(&self, link: u64) {
        if !self.release(link) {
            tracing::debug!(link, "stale link closed");
            return;
        }
        self.live.store(false, Ordering::Release);

        let was_connected = {
            let mut state = self.state.lock();
            let was_connected = *state == ConnectionState::Connected;
            if was_connected {
                *state = ConnectionState::Disconnected;
            }
            was_connected
        };

        tracing::info!(link, "disconnected from transaction manager");
        if was_connected {
            self.reconnector.reconnect();
        }
    }

    pub fn on_idle(&self, link: u64, idle: IdleState) {
        if !self.is_current(link) {
            return;
        }

        match idle {
            IdleState::WriterIdle => {
                if self.state() == ConnectionState::Connected {
                    self.send_heartbeat();
                }
            }
            IdleState::ReaderIdle | IdleState::AllIdle => {
                {
                    let mut state = self.state.lock();
                    if *state != ConnectionState::Connected {
                        return;
                    }
                    *state = ConnectionState::Reconnecting;
                }
                tracing::info!(link, ?idle, "transaction manager unresponsive, reconnecting");
                self.reconnector.reconnect();
            }
        }
    }

    /// Log a transport fault and force the link closed
    pub fn on_transport_error(&self, link: u64, error: &dyn Display) {
        tracing::error!(link, %error, "transport exception, closing link");
        if let Some(transport) = self.active().filter(|t| t.id() == link) {
            transport.close();
        }
    }

    pub fn send_heartbeat(&self) {
        let Some(transport) = self.active() else {
            return;
        };

        let frame = Frame::heart(self.meta.current_meta_info(), self.serial_protocol);
        match transport.send(&frame) {
            Ok(()) => tracing::debug!(link = transport.id(), "heartbeat sent"),
            Err(e) => tracing::warn!(link = transport.id(), error = %e, "heartbeat not sent"),
        }
    }

    /// Close the current handle, if any
    pub fn close_active(&self) {
        if let Some(transport) = self.active() {
            transport.close();
        }
    }

    fn is_current(&self, link: u64) -> bool {
        self.active.read().as_ref().is_some_and(|t| t.id() == link)
    }

    fn release(&self, link: u64) -> bool {
        let mut active = self.active.write();
        if active.as_ref().is_some_and(|t| t.id() == link) {
            *active = None;
            true
        } else {
            false
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(transport) = self.active.get_mut().take() {
            transport.close();
        }
    }
}
