//! Connection monitor: a one-shot `/health` check per mount.

use serde::Serialize;

use crate::runtime::{Completion, MountId, Request, RequestKind, Runtime, Ticket};
use crate::views::{Applied, ViewController};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Checking",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
        }
    }
}

pub struct ConnectionMonitor {
    mount: MountId,
    state: ConnectionState,
    check_seq: u64,
}

impl ConnectionMonitor {
    /// Mount and issue the single health check. There is no re-check.
    pub fn mount(mount: MountId, rt: &mut dyn Runtime) -> Self {
        rt.issue(Ticket {
            mount,
            seq: 1,
            request: Request::Health,
        });
        Self {
            mount,
            state: ConnectionState::Unknown,
            check_seq: 1,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

impl ViewController for ConnectionMonitor {
    fn mount_id(&self) -> MountId {
        self.mount
    }

    fn on_completion(&mut self, completion: Completion) -> Applied {
        if completion.kind != RequestKind::Health || completion.seq != self.check_seq {
            return Applied::Stale;
        }
        let next = if completion.result.is_ok() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        if next == self.state {
            return Applied::Unchanged;
        }
        self.state = next;
        Applied::Changed
    }
}
