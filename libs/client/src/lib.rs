//! Txlink Client - Request/response correlation for the transaction manager
//!
//! Turns the asynchronous coordinator link into blocking calls. Each
//! [`TxClient::send_and_wait`] registers a [`PendingCall`] under a fresh
//! key, sends the frame, and parks until the [`Dispatcher`] routes the
//! matching reply or the per-call timer resolves it with a timeout value.
//!
//! The [`Connection`] tracks link state, sends heartbeats on writer idle and
//! asks the [`Connector`] for a new link when the old one dies.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use txlink_client::{ClientConfig, StaticMetaInfo, TxClient};
//! use txlink_core::{ActionCode, Frame, TransactionGroup};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let client = TxClient::start(
//!     ClientConfig::default(),
//!     Arc::new(StaticMetaInfo::new("order-service@10.0.0.7:8080")),
//!     runtime.handle().clone(),
//! );
//!
//! let frame = Frame::new(ActionCode::CreateGroup).with_group(TransactionGroup::new("g1", 0));
//! let created = client.send_and_wait(frame).and_then(|r| r.as_bool());
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod connector;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod key;
pub mod meta;
pub mod pending;
pub mod registry;
pub mod transport;

// Re-exports for convenience
pub use client::TxClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use connection::{Connection, ConnectionState, Reconnect};
pub use connector::Connector;
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{Error, Result};
pub use handler::ClientHandler;
pub use key::{IdWorker, KeyGenerator};
pub use meta::{MetaInfoProvider, StaticMetaInfo};
pub use pending::{PendingCall, Reply};
pub use registry::Registry;
pub use transport::{FrameTransport, ScheduledTask};
