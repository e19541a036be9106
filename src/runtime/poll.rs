use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use super::{Event, MountId, PollTarget};

/// Scoped periodic timer.
///
/// Owned by the controller that started it. Dropping the handle cancels the
/// timer: the ticker thread wakes immediately, exits, and sends no further
/// ticks.
#[derive(Debug)]
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    // Dropping this sender disconnects the ticker's wake channel.
    _stop: Option<Sender<()>>,
}

impl PollHandle {
    /// Spawn a ticker thread sending `Event::Tick` every `interval`.
    pub(crate) fn spawn(
        interval: Duration,
        mount: MountId,
        target: PollTarget,
        events: Sender<Event>,
    ) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let flag = Arc::clone(&cancelled);

        let spawned = thread::Builder::new()
            .name("nexus-poll".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if flag.load(Ordering::SeqCst) {
                                break;
                            }
                            if events.send(Event::Tick { mount, target }).is_err() {
                                break;
                            }
                        }
                        _ => break,
                    }
                }
            });

        if spawned.is_err() {
            // No ticker thread: the view keeps its mount-time data.
            cancelled.store(true, Ordering::SeqCst);
        }

        Self {
            cancelled,
            _stop: Some(stop_tx),
        }
    }

    /// A handle with no thread behind it. The returned flag flips to `true`
    /// when the handle is dropped.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, Arc<AtomicBool>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        (
            Self {
                cancelled: Arc::clone(&cancelled),
                _stop: None,
            },
            cancelled,
        )
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
