//! Event-driven connection to a single peer.
//!
//! A [`Link`] owns one TCP connection and drives it from three tasks on the
//! tokio runtime that opened it:
//!
//! - reader: decodes length-prefixed frames and hands them to the handler
//! - writer: drains the outbound queue, so `send` never blocks the caller
//! - idle monitor: reports reader/writer/all idle events
//!
//! Every way a link can end (peer EOF, I/O error, explicit close) funnels
//! into one teardown that fires [`LinkHandler::on_inactive`] exactly once.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{Error, Result};
use crate::idle::{IdleConfig, IdleDetector, IdleState};
use crate::transport::{TcpReadHalf, TcpTransport, TcpWriteHalf};

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

/// Settings for opening a link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkConfig {
    pub connect_timeout: Option<Duration>,
    /// Upper bound on writing one frame; a peer that stops draining is a fault
    pub send_timeout: Option<Duration>,
    /// Upper bound on waiting for the next frame
    pub receive_timeout: Option<Duration>,
    pub idle: IdleConfig,
}

/// Receives the events of a link
///
/// Callbacks run on the link's runtime tasks and must not block.
pub trait LinkHandler: Send + Sync + 'static {
    /// The link is connected and can send
    fn on_active(&self, _link: &Link) {}

    /// One inbound frame
    fn on_message(&self, link: &Link, bytes: Vec<u8>);

    fn on_idle(&self, _link: &Link, _state: IdleState) {}

    /// An I/O fault; the link tears itself down right after
    fn on_error(&self, _link: &Link, _error: &Error) {}

    /// The link is gone; fired once
    fn on_inactive(&self, _link: &Link) {}
}

/// Cheap, cloneable handle to a live connection
#[derive(Clone)]
pub struct Link {
    inner: Arc<LinkInner>,
}

struct LinkInner {
    id: u64,
    peer: SocketAddr,
    active: AtomicBool,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    shutdown: watch::Sender<bool>,
    idle: Mutex<IdleDetector>,
    handler: Arc<dyn LinkHandler>,
    runtime: Handle,
}

impl Link {
    /// Connect to `addr` and start driving the connection
    pub async fn connect(
        addr: SocketAddr,
        config: LinkConfig,
        handler: Arc<dyn LinkHandler>,
    ) -> Result<Link> {
        let transport = TcpTransport::builder()
            .address(addr)
            .connect_timeout(config.connect_timeout)
            .send_timeout(config.send_timeout)
            .receive_timeout(config.receive_timeout)
            .connect()
            .await?;
        Ok(Self::start(transport, addr, config.idle, handler))
    }

    /// Drive an already connected transport
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        transport: TcpTransport,
        peer: SocketAddr,
        idle: IdleConfig,
        handler: Arc<dyn LinkHandler>,
    ) -> Link {
        let (reader, writer) = transport.into_split();
        let (outbound, queue) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);

        let link = Link {
            inner: Arc::new(LinkInner {
                id: NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed),
                peer,
                active: AtomicBool::new(true),
                outbound,
                shutdown,
                idle: Mutex::new(IdleDetector::new(idle, Instant::now())),
                handler,
                runtime: Handle::current(),
            }),
        };

        tracing::debug!(link = link.id(), %peer, "link up");
        link.inner.handler.on_active(&link);

        let runtime = &link.inner.runtime;
        runtime.spawn(read_loop(link.clone(), reader));
        runtime.spawn(write_loop(link.clone(), writer, queue));
        if let Some(every) = idle.check_interval() {
            runtime.spawn(idle_loop(link.clone(), every));
        }

        link
    }

    /// Process-unique id of this link
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Queue one frame for the writer task
    pub fn send(&self, bytes: Vec<u8>) -> Result<()> {
        if !self.is_active() {
            return Err(Error::ConnectionClosed);
        }
        self.inner
            .outbound
            .send(bytes)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Run `task` once on the link's runtime after `delay`
    pub fn schedule_once<F>(&self, delay: Duration, task: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        TimerHandle { task }
    }

    /// Tear the link down; idempotent
    pub fn close(&self) {
        if self.inner.active.swap(false, Ordering::AcqRel) {
            self.inner.shutdown.send_replace(true);
            tracing::debug!(link = self.id(), peer = %self.inner.peer, "link down");
            self.inner.handler.on_inactive(self);
        }
    }

    fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.subscribe()
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.inner.id)
            .field("peer", &self.inner.peer)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Handle to a task started with [`Link::schedule_once`]
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Best-effort cancel; a task already running is not interrupted
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_done(&self) -> bool {
        self.task.is_finished()
    }
}

async fn read_loop(link: Link, mut reader: TcpReadHalf) {
    let mut closed = link.shutdown_signal();
    loop {
        let received = tokio::select! {
            _ = closed.wait_for(|closed| *closed) => break,
            received = reader.receive() => received,
        };

        match received {
            Ok(bytes) => {
                link.inner.idle.lock().record_read(Instant::now());
                link.inner.handler.on_message(&link, bytes);
            }
            Err(e) if e.is_disconnect() => break,
            Err(e) => {
                link.inner.handler.on_error(&link, &e);
                break;
            }
        }
    }
    link.close();
}

async fn write_loop(
    link: Link,
    mut writer: TcpWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let mut closed = link.shutdown_signal();
    loop {
        let bytes = tokio::select! {
            _ = closed.wait_for(|closed| *closed) => break,
            next = queue.recv() => match next {
                Some(bytes) => bytes,
                None => break,
            },
        };

        if let Err(e) = writer.send(&bytes).await {
            if !e.is_disconnect() {
                link.inner.handler.on_error(&link, &e);
            }
            break;
        }
        link.inner.idle.lock().record_write(Instant::now());
    }

    if let Err(e) = writer.close().await {
        tracing::trace!(link = link.id(), error = %e, "write half already gone");
    }
    link.close();
}

async fn idle_loop(link: Link, every: Duration) {
    let mut closed = link.shutdown_signal();
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = closed.wait_for(|closed| *closed) => break,
            _ = ticker.tick() => {}
        }

        let due = link.inner.idle.lock().poll(Instant::now());
        for state in due {
            if !link.is_active() {
                return;
            }
            link.inner.handler.on_idle(&link, state);
        }
    }
}
