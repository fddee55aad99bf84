//! Txlink Core - Wire model shared with the transaction manager
//!
//! Defines the frames exchanged over the coordinator link, the action and
//! result codes they carry, and the transaction group payloads the client
//! reads when correlating replies.

pub mod action;
pub mod error;
pub mod frame;
pub mod group;

// Re-exports for convenience
pub use action::{ActionCode, ResultCode};
pub use error::{Error, Result};
pub use frame::{Frame, Payload};
pub use group::{TransactionGroup, TransactionItem};
