use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::error::Result;
use crate::link::{Link, TimerHandle};

/// High-level channel for typed messages over a live link
///
/// Combines a link and codec; cloning is cheap and every clone writes to
/// the same connection
#[derive(Debug, Clone)]
pub struct Channel<C> {
    link: Link,
    codec: C,
}

impl<C: Codec> Channel<C> {
    /// Create a channel over an existing link
    pub fn from_link(link: Link, codec: C) -> Self {
        Self { link, codec }
    }

    /// Encode and queue a message
    pub fn send<T: Serialize>(&self, message: &T) -> Result<()> {
        let bytes = self.codec.encode(message)?;
        self.link.send(bytes)
    }

    /// Decode a frame received on this channel's link
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, bytes: &[u8]) -> Result<T> {
        self.codec.decode(bytes)
    }

    pub fn is_active(&self) -> bool {
        self.link.is_active()
    }

    /// Run `task` once on the channel's runtime after `delay`
    pub fn schedule_once<F>(&self, delay: Duration, task: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.link.schedule_once(delay, task)
    }

    /// Close the underlying link
    pub fn close(&self) {
        self.link.close()
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }
}
