//! Correlation key generation.
//!
//! Keys are snowflake-style ids rendered as decimal strings: 41 bits of
//! milliseconds since [`EPOCH_MILLIS`], a 10 bit worker id and a 12 bit
//! per-millisecond sequence.

use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::Rng;

/// 2020-01-01T00:00:00Z
pub const EPOCH_MILLIS: u64 = 1_577_836_800_000;

const WORKER_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_WORKER: u64 = (1 << WORKER_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Source of correlation keys
///
/// Implementations must never hand out the same key twice within a process.
pub trait KeyGenerator: Send + Sync {
    fn next_key(&self) -> String;
}

/// Snowflake id generator
#[derive(Debug)]
pub struct IdWorker {
    worker_id: u64,
    clock: Mutex<Clock>,
}

#[derive(Debug, Default)]
struct Clock {
    last_millis: u64,
    sequence: u64,
}

impl IdWorker {
    /// Create a worker with an explicit id (masked to 10 bits)
    pub fn new(worker_id: u64) -> Self {
        Self {
            worker_id: worker_id & MAX_WORKER,
            clock: Mutex::new(Clock::default()),
        }
    }

    /// Create a worker with a random id
    pub fn random() -> Self {
        Self::new(rand::thread_rng().gen_range(0..=MAX_WORKER))
    }

    /// Process-wide worker shared by every client
    pub fn global() -> Arc<IdWorker> {
        static GLOBAL: OnceLock<Arc<IdWorker>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(IdWorker::random())))
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// Next id; strictly increasing for this worker
    pub fn next_id(&self) -> u64 {
        self.next_id_at(now_millis())
    }

    fn next_id_at(&self, now: u64) -> u64 {
        let mut clock = self.clock.lock();

        // A clock that steps backwards keeps using the last observed millisecond
        let mut millis = now.max(clock.last_millis);
        if millis == clock.last_millis {
            clock.sequence = (clock.sequence + 1) & SEQUENCE_MASK;
            if clock.sequence == 0 {
                // Sequence exhausted: borrow the next millisecond instead of waiting
                millis = clock.last_millis + 1;
            }
        } else {
            clock.sequence = 0;
        }
        clock.last_millis = millis;

        ((millis - EPOCH_MILLIS) << (WORKER_BITS + SEQUENCE_BITS))
            | (self.worker_id << SEQUENCE_BITS)
            | clock.sequence
    }
}

impl KeyGenerator for IdWorker {
    fn next_key(&self) -> String {
        self.next_id().to_string()
    }
}

fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(EPOCH_MILLIS);
    millis.max(EPOCH_MILLIS)
}
