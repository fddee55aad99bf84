//! Single-resolution rendezvous between a blocked caller and whoever answers it.
//!
//! A [`PendingCall`] is resolved at most once. The dispatcher (reply arrived)
//! and the timeout task (reply is late) may both try; the first `resolve`
//! wins and every later attempt is a no-op. The winner stores a producer,
//! not a value, and the caller runs it after waking.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use txlink_core::{ActionCode, ResultCode, TransactionGroup};

use crate::error::Result;

/// Value a pending call resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Outcome of a plain command
    Success(bool),
    /// A status code: group status, item status, or [`ResultCode::Timeout`]
    Status(i32),
    /// Group snapshot; `None` when the manager sent none or the call timed out
    Group(Option<TransactionGroup>),
}

impl Reply {
    /// Value a call resolves to when no reply arrives in time
    pub fn timeout_for(action: Option<ActionCode>) -> Reply {
        match action {
            Some(ActionCode::GetTransactionGroupStatus) => {
                Reply::Status(ResultCode::Timeout.code())
            }
            Some(ActionCode::FindTransactionGroupInfo) => Reply::Group(None),
            _ => Reply::Success(false),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Reply::Success(success) => Some(*success),
            _ => None,
        }
    }

    pub fn as_status(&self) -> Option<i32> {
        match self {
            Reply::Status(status) => Some(*status),
            _ => None,
        }
    }

    pub fn into_group(self) -> Option<TransactionGroup> {
        match self {
            Reply::Group(group) => group,
            _ => None,
        }
    }
}

/// Deferred result, evaluated by the waiter
pub type Producer = Box<dyn FnOnce() -> Result<Reply> + Send>;

/// One in-flight request
pub struct PendingCall {
    key: String,
    state: Mutex<Resolution>,
    signal: Condvar,
}

#[derive(Default)]
struct Resolution {
    resolved: bool,
    producer: Option<Producer>,
}

impl PendingCall {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: Mutex::new(Resolution::default()),
            signal: Condvar::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_resolved(&self) -> bool {
        self.state.lock().resolved
    }

    /// Store `producer` and wake the waiter
    ///
    /// Returns `false`, dropping `producer`, if the call was already resolved.
    pub fn resolve(&self, producer: Producer) -> bool {
        let mut state = self.state.lock();
        if state.resolved {
            return false;
        }
        state.resolved = true;
        state.producer = Some(producer);
        drop(state);

        self.signal.notify_all();
        true
    }

    /// Resolve with a ready value
    pub fn resolve_with(&self, reply: Reply) -> bool {
        self.resolve(Box::new(move || Ok(reply)))
    }

    /// Block until resolved; returns at once if already resolved
    pub fn await_resolution(&self) {
        let mut state = self.state.lock();
        while !state.resolved {
            self.signal.wait(&mut state);
        }
    }

    /// Like [`await_resolution`](Self::await_resolution) with an upper bound
    ///
    /// Returns whether the call is resolved. A timeout too large to express
    /// as a deadline waits without bound.
    pub fn await_resolution_for(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.await_resolution();
            return true;
        };
        let mut state = self.state.lock();
        while !state.resolved {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                return state.resolved;
            }
        }
        true
    }

    /// Run the stored producer
    ///
    /// A failing producer is logged and yields `None`, as does a call that
    /// is unresolved or whose reply was already taken.
    pub fn take_reply(&self) -> Option<Reply> {
        let producer = self.state.lock().producer.take()?;
        match producer() {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "reply producer failed");
                None
            }
        }
    }
}

impl fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("key", &self.key)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
