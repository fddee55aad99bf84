use std::time::Duration;

use txlink_core::Frame;
use txlink_fabric::codec::Codec;
use txlink_fabric::{Channel, TimerHandle};

use crate::error::Result;

/// Work scheduled with [`FrameTransport::schedule_once`]
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled task
pub trait ScheduledTask: Send {
    /// Best-effort cancel
    fn cancel(&self);

    /// Whether the task has run (or was cancelled)
    fn is_done(&self) -> bool;
}

/// The active connection as seen by the client
///
/// Implemented by [`Channel`]; tests substitute their own.
pub trait FrameTransport: Send + Sync {
    /// Identity of the underlying connection
    fn id(&self) -> u64;

    fn is_connected(&self) -> bool;

    /// Queue a frame; never blocks on the network
    fn send(&self, frame: &Frame) -> Result<()>;

    /// Run `task` once after `delay` on the transport's event tasks
    fn schedule_once(&self, delay: Duration, task: Task) -> Box<dyn ScheduledTask>;

    fn close(&self);
}

impl ScheduledTask for TimerHandle {
    fn cancel(&self) {
        TimerHandle::cancel(self)
    }

    fn is_done(&self) -> bool {
        TimerHandle::is_done(self)
    }
}

impl<C: Codec + 'static> FrameTransport for Channel<C> {
    fn id(&self) -> u64 {
        self.link().id()
    }

    fn is_connected(&self) -> bool {
        self.is_active()
    }

    fn send(&self, frame: &Frame) -> Result<()> {
        Channel::send(self, frame)?;
        Ok(())
    }

    fn schedule_once(&self, delay: Duration, task: Task) -> Box<dyn ScheduledTask> {
        Box::new(Channel::schedule_once(self, delay, task))
    }

    fn close(&self) {
        Channel::close(self)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use parking_lot::Mutex;
    use txlink_core::Frame;

    use super::{FrameTransport, ScheduledTask, Task};
    use crate::error::{Error, Result};

    type SendHook = Box<dyn Fn(&Frame) + Send + Sync>;

    /// In-memory transport; timers run on plain threads
    pub(crate) struct MockTransport {
        id: u64,
        connected: AtomicBool,
        closed: AtomicBool,
        fail_sends: AtomicBool,
        sent: Mutex<Vec<Frame>>,
        timers: Mutex<Vec<Arc<TimerState>>>,
        on_send: Mutex<Option<SendHook>>,
    }

    #[derive(Default)]
    pub(crate) struct TimerState {
        pub cancelled: AtomicBool,
        pub fired: AtomicBool,
        pub done: AtomicBool,
    }

    struct MockTimer(Arc<TimerState>);

    impl ScheduledTask for MockTimer {
        fn cancel(&self) {
            self.0.cancelled.store(true, Ordering::SeqCst);
        }

        fn is_done(&self) -> bool {
            self.0.done.load(Ordering::SeqCst)
        }
    }

    impl MockTransport {
        pub(crate) fn new(id: u64) -> Arc<Self> {
            Arc::new(Self {
                id,
                connected: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                fail_sends: AtomicBool::new(false),
                sent: Mutex::new(Vec::new()),
                timers: Mutex::new(Vec::new()),
                on_send: Mutex::new(None),
            })
        }

        /// Run `hook` synchronously for every frame sent
        pub(crate) fn on_send(&self, hook: impl Fn(&Frame) + Send + Sync + 'static) {
            *self.on_send.lock() = Some(Box::new(hook));
        }

        pub(crate) fn set_connected(&self, connected: bool) {
            self.connected.store(connected, Ordering::SeqCst);
        }

        pub(crate) fn fail_sends(&self) {
            self.fail_sends.store(true, Ordering::SeqCst);
        }

        pub(crate) fn sent(&self) -> Vec<Frame> {
            self.sent.lock().clone()
        }

        pub(crate) fn timers(&self) -> Vec<Arc<TimerState>> {
            self.timers.lock().clone()
        }

        pub(crate) fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl FrameTransport for MockTransport {
        fn id(&self) -> u64 {
            self.id
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn send(&self, frame: &Frame) -> Result<()> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(Error::Fabric(txlink_fabric::Error::ConnectionClosed));
            }
            self.sent.lock().push(frame.clone());
            if let Some(hook) = self.on_send.lock().as_ref() {
                hook(frame);
            }
            Ok(())
        }

        fn schedule_once(&self, delay: Duration, task: Task) -> Box<dyn ScheduledTask> {
            let state = Arc::new(TimerState::default());
            self.timers.lock().push(Arc::clone(&state));

            let timer = Arc::clone(&state);
            thread::spawn(move || {
                thread::sleep(delay);
                if !timer.cancelled.load(Ordering::SeqCst) {
                    task();
                    timer.fired.store(true, Ordering::SeqCst);
                }
                timer.done.store(true, Ordering::SeqCst);
            });

            Box::new(MockTimer(state))
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
            self.connected.store(false, Ordering::SeqCst);
        }
    }
}
