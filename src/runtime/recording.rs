//! Test runtime: records tickets and hands out inspectable timers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{MountId, PollHandle, PollTarget, Request, Runtime, Ticket};

pub(crate) struct Timer {
    pub mount: MountId,
    pub target: PollTarget,
    pub interval: Duration,
    cancelled: Arc<AtomicBool>,
}

impl Timer {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct RecordingRuntime {
    pub tickets: Vec<Ticket>,
    pub timers: Vec<Timer>,
}

impl RecordingRuntime {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Drain and return the recorded tickets.
    pub(crate) fn take(&mut self) -> Vec<Ticket> {
        std::mem::take(&mut self.tickets)
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.tickets.iter().map(|t| t.request.clone()).collect()
    }
}

impl Runtime for RecordingRuntime {
    fn issue(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }

    fn every(&mut self, interval: Duration, mount: MountId, target: PollTarget) -> PollHandle {
        let (handle, cancelled) = PollHandle::detached();
        self.timers.push(Timer {
            mount,
            target,
            interval,
            cancelled,
        });
        handle
    }
}
