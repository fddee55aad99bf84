//! Read/write inactivity detection for a live link.
//!
//! Mirrors the classic reader/writer/all idle split: each direction has its
//! own optional window, and the combined "all" window only counts as idle
//! when neither direction moved. Time is always passed in by the caller.

use std::time::{Duration, Instant};

/// Which direction has gone quiet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdleState {
    /// Nothing received for the reader window
    ReaderIdle,
    /// Nothing sent for the writer window
    WriterIdle,
    /// Nothing sent or received for the all window
    AllIdle,
}

/// Idle windows; `None` disables that kind of event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleConfig {
    pub reader_idle: Option<Duration>,
    pub writer_idle: Option<Duration>,
    pub all_idle: Option<Duration>,
}

impl IdleConfig {
    /// How often the monitor should poll to honour the shortest window
    pub fn check_interval(&self) -> Option<Duration> {
        [self.reader_idle, self.writer_idle, self.all_idle]
            .into_iter()
            .flatten()
            .min()
            .map(|shortest| (shortest / 4).max(Duration::from_millis(5)))
    }
}

/// Tracks activity and reports idle events
///
/// An event re-fires once per elapsed window for as long as the direction
/// stays quiet.
#[derive(Debug, Clone)]
pub struct IdleDetector {
    config: IdleConfig,
    reader_mark: Instant,
    writer_mark: Instant,
    all_mark: Instant,
}

impl IdleDetector {
    pub fn new(config: IdleConfig, now: Instant) -> Self {
        Self {
            config,
            reader_mark: now,
            writer_mark: now,
            all_mark: now,
        }
    }

    pub fn config(&self) -> &IdleConfig {
        &self.config
    }

    /// Call when a frame was received
    pub fn record_read(&mut self, now: Instant) {
        self.reader_mark = now;
        self.all_mark = now;
    }

    /// Call when a frame was written
    pub fn record_write(&mut self, now: Instant) {
        self.writer_mark = now;
        self.all_mark = now;
    }

    /// Idle events due at `now`, in reader, writer, all order
    pub fn poll(&mut self, now: Instant) -> Vec<IdleState> {
        let mut due = Vec::new();

        if fire(&mut self.reader_mark, self.config.reader_idle, now) {
            due.push(IdleState::ReaderIdle);
        }
        if fire(&mut self.writer_mark, self.config.writer_idle, now) {
            due.push(IdleState::WriterIdle);
        }
        if fire(&mut self.all_mark, self.config.all_idle, now) {
            due.push(IdleState::AllIdle);
        }

        due
    }
}

fn fire(mark: &mut Instant, window: Option<Duration>, now: Instant) -> bool {
    match window {
        Some(window) if now.saturating_duration_since(*mark) >= window => {
            *mark = now;
            true
        }
        _ => false,
    }
}
