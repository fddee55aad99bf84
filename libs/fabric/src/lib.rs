//! Txlink Fabric - Transport layer for the coordinator link
//!
//! Provides a length-prefixed TCP transport, codec support (bincode), and
//! [`Link`], an event-driven connection that pushes inbound frames, idle
//! events and lifecycle changes to a [`LinkHandler`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use txlink_fabric::{codec::BincodeCodec, Channel, Link, LinkConfig, LinkHandler};
//!
//! struct Print;
//!
//! impl LinkHandler for Print {
//!     fn on_message(&self, link: &Link, bytes: Vec<u8>) {
//!         println!("{} bytes from link {}", bytes.len(), link.id());
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let addr = "127.0.0.1:9998".parse()?;
//! let link = Link::connect(addr, LinkConfig::default(), Arc::new(Print)).await?;
//! let channel = Channel::from_link(link, BincodeCodec);
//! channel.send(&"hello".to_string())?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod idle;
pub mod link;
pub mod transport;

// Re-exports for convenience
pub use channel::Channel;
pub use error::{Error, Result};
pub use idle::{IdleConfig, IdleState};
pub use link::{Link, LinkConfig, LinkHandler, TimerHandle};
