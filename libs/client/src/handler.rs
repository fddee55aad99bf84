use std::sync::{Arc, Weak};

use txlink_fabric::codec::Codec;
use txlink_fabric::{Channel, Error, IdleState, Link, LinkHandler};

use crate::connection::Connection;
use crate::dispatcher::Dispatcher;

/// Bridges link events into the connection state machine and dispatcher
pub struct ClientHandler<C> {
    connection: Weak<Connection>,
    dispatcher: Arc<Dispatcher>,
    codec: C,
}

impl<C> ClientHandler<C> {
    pub fn new(connection: Weak<Connection>, dispatcher: Arc<Dispatcher>, codec: C) -> Self {
        Self {
            connection,
            dispatcher,
            codec,
        }
    }
}

impl<C: Codec + Clone + 'static> LinkHandler for ClientHandler<C> {
    fn on_active(&self, link: &Link) {
        match self.connection.upgrade() {
            Some(connection) => {
                let channel = Channel::from_link(link.clone(), self.codec.clone());
                connection.on_active(Arc::new(channel));
            }
            // Client is gone
            None => link.close(),
        }
    }

    fn on_message(&self, link: &Link, bytes: Vec<u8>) {
        if let Some(connection) = self.connection.upgrade() {
            connection.mark_live();
        }
        let outcome = self.dispatcher.dispatch_bytes(&self.codec, &bytes);
        tracing::trace!(link = link.id(), ?outcome, "frame handled");
    }

    fn on_idle(&self, link: &Link, state: IdleState) {
        if let Some(connection) = self.connection.upgrade() {
            connection.on_idle(link.id(), state);
        }
    }

    fn on_error(&self, link: &Link, error: &Error) {
        match self.connection.upgrade() {
            Some(connection) => connection.on_transport_error(link.id(), error),
            None => link.close(),
        }
    }

    fn on_inactive(&self, link: &Link) {
        if let Some(connection) = self.connection.upgrade() {
            connection.on_inactive(link.id());
        }
    }
}
