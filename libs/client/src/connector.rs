use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use txlink_fabric::codec::Codec;
use txlink_fabric::Link;

use crate::config::ClientConfig;
use crate::connection::{Connection, Reconnect};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::handler::ClientHandler;

/// Opens links to the transaction manager, retrying on failure
///
/// `reconnect` only spawns the connect loop onto the runtime. Triggers that
/// arrive while a loop is running are folded into it; if the loop ends with
/// the connection still down, it runs once more.
#[derive(Clone)]
pub struct Connector<C> {
    config: ClientConfig,
    runtime: Handle,
    connection: Weak<Connection>,
    dispatcher: Arc<Dispatcher>,
    codec: C,
    in_flight: Arc<AtomicBool>,
    retrigger: Arc<AtomicBool>,
    attempts: Arc<AtomicU64>,
}

impl<C: Codec + Clone + 'static> Connector<C> {
    pub fn new(
        config: ClientConfig,
        runtime: Handle,
        connection: Weak<Connection>,
        dispatcher: Arc<Dispatcher>,
        codec: C,
    ) -> Self {
        Self {
            config,
            runtime,
            connection,
            dispatcher,
            codec,
            in_flight: Arc::new(AtomicBool::new(false)),
            retrigger: Arc::new(AtomicBool::new(false)),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// One connect attempt
    pub async fn connect(&self) -> Result<Link> {
        let handler = Arc::new(ClientHandler::new(
            self.connection.clone(),
            Arc::clone(&self.dispatcher),
            self.codec.clone(),
        ));
        let link = Link::connect(self.config.address, self.config.link_config(), handler).await?;
        Ok(link)
    }

    /// Connect attempts made so far, across every reconnect
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    fn needs_link(&self) -> bool {
        self.connection.upgrade().is_some_and(|c| !c.is_connected())
    }

    async fn connect_with_retry(&self) {
        {
            let Some(connection) = self.connection.upgrade() else {
                return;
            };
            connection.begin_connect();
            connection.close_active();
        }

        let max = self.config.retry_max.max(1);
        for attempt in 1..=max {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            match self.connect().await {
                Ok(link) => {
                    tracing::debug!(link = link.id(), attempt, "connected");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        address = %self.config.address,
                        attempt,
                        max,
                        error = %e,
                        "connect to transaction manager failed"
                    );
                }
            }
            if attempt < max {
                tokio::time::sleep(self.config.retry_interval).await;
            }
        }

        tracing::error!(address = %self.config.address, "giving up on transaction manager");
        if let Some(connection) = self.connection.upgrade() {
            connection.give_up();
        }
    }
}

impl<C: Codec + Clone + 'static> Reconnect for Connector<C> {
    fn reconnect(&self) {
        self.retrigger.store(true, Ordering::Release);
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!("reconnect already in progress");
            return;
        }

        let connector = self.clone();
        self.runtime.spawn(async move {
            loop {
                connector.retrigger.store(false, Ordering::Release);
                connector.connect_with_retry().await;
                connector.in_flight.store(false, Ordering::Release);

                // A link that died before the flag cleared left its trigger here
                if !connector.retrigger.load(Ordering::Acquire) || !connector.needs_link() {
                    return;
                }
                if connector.in_flight.swap(true, Ordering::AcqRel) {
                    return;
                }
            }
        });
    }
}
