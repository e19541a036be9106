//! Request runtime for the view controllers.
//!
//! View state is owned by one thread. Controllers never block on the
//! network: they hand a [`Ticket`] to a [`Runtime`], and the result comes
//! back later as an [`Event::Completed`] that the owning thread applies.
//! Periodic refreshes are [`Event::Tick`]s produced by a scoped timer whose
//! [`PollHandle`] stops it when dropped.
//!
//! Every mounted controller carries a [`MountId`]. Events addressed to a
//! mount that no longer exists are dropped by the shell.

mod dispatcher;
mod poll;
#[cfg(test)]
pub(crate) mod recording;
mod sequence;

use std::time::Duration;

use serde::Serialize;

use crate::api::types::{
    ChatReply, Episode, MemoryRecord, NamedSkill, Pattern, StatsSnapshot, ToolDescriptor,
};
use crate::api::{ApiResult, Backend, endpoints};

pub use dispatcher::Dispatcher;
pub use poll::PollHandle;
pub use sequence::{Sequencer, StalePolicy};

/// Identity of one mounted controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MountId(pub u64);

/// A backend call a controller wants made.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Health,
    Chat { message: String },
    SearchMemory { query: String, n_results: u32 },
    Episodes { n: u32 },
    Stats,
    Patterns,
    Skills,
    Tools,
}

/// Request discriminant, kept on completions so failures can be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Health,
    Chat,
    SearchMemory,
    Episodes,
    Stats,
    Patterns,
    Skills,
    Tools,
}

impl RequestKind {
    /// Endpoint label used in the activity log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Health => endpoints::HEALTH,
            Self::Chat => endpoints::CHAT,
            Self::SearchMemory => endpoints::MEMORY_QUERY,
            Self::Episodes => endpoints::MEMORY_EPISODES,
            Self::Stats => endpoints::MEMORY_STATS,
            Self::Patterns => endpoints::LEARNING_PATTERNS,
            Self::Skills => endpoints::LEARNING_SKILLS,
            Self::Tools => endpoints::TOOLS,
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Self::Chat | Self::SearchMemory => "POST",
            _ => "GET",
        }
    }
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Health => RequestKind::Health,
            Self::Chat { .. } => RequestKind::Chat,
            Self::SearchMemory { .. } => RequestKind::SearchMemory,
            Self::Episodes { .. } => RequestKind::Episodes,
            Self::Stats => RequestKind::Stats,
            Self::Patterns => RequestKind::Patterns,
            Self::Skills => RequestKind::Skills,
            Self::Tools => RequestKind::Tools,
        }
    }
}

/// A request tagged with its issuing mount and per-controller sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub mount: MountId,
    pub seq: u64,
    pub request: Request,
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Health,
    Chat(ChatReply),
    Memories(Vec<MemoryRecord>),
    Episodes(Vec<Episode>),
    Stats(StatsSnapshot),
    Patterns(Vec<Pattern>),
    Skills(Vec<NamedSkill>),
    Tools(Vec<ToolDescriptor>),
}

/// The outcome of a [`Ticket`], delivered back to the owning thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub mount: MountId,
    pub seq: u64,
    pub kind: RequestKind,
    pub result: ApiResult<Payload>,
}

/// Which periodic refresh a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollTarget {
    Learning,
    Stats,
}

/// Everything the owning thread reacts to.
#[derive(Debug)]
pub enum Event {
    Completed(Completion),
    Tick { mount: MountId, target: PollTarget },
    /// A line typed into the terminal dashboard.
    Input(String),
    InputClosed,
}

/// Where controllers send work.
pub trait Runtime {
    /// Start a request. Never blocks; the result arrives as an event.
    fn issue(&mut self, ticket: Ticket);

    /// Start a periodic tick for `mount`. Dropping the handle stops it.
    fn every(&mut self, interval: Duration, mount: MountId, target: PollTarget) -> PollHandle;
}

/// Run one request to completion against a backend. Called on worker
/// threads by the dispatcher.
pub fn execute(backend: &dyn Backend, request: &Request) -> ApiResult<Payload> {
    match request {
        Request::Health => endpoints::health(backend).map(|_| Payload::Health),
        Request::Chat { message } => endpoints::chat(backend, message).map(Payload::Chat),
        Request::SearchMemory { query, n_results } => {
            endpoints::query_memory(backend, query, *n_results).map(Payload::Memories)
        }
        Request::Episodes { n } => endpoints::recent_episodes(backend, *n).map(Payload::Episodes),
        Request::Stats => endpoints::memory_stats(backend).map(Payload::Stats),
        Request::Patterns => endpoints::patterns(backend).map(Payload::Patterns),
        Request::Skills => endpoints::skills(backend).map(Payload::Skills),
        Request::Tools => endpoints::tools(backend).map(Payload::Tools),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
