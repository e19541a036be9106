//! Memory panel: vector search results and recent episodes.
//!
//! Both lists are replaced wholesale on success. Failures are logged by the
//! shell and leave the previous list in place.

use serde::{Deserialize, Serialize};

use super::format;
use super::{Applied, ViewController};
use crate::api::types::{Episode, MemoryRecord};
use crate::config::schema::MemoryConfig;
use crate::runtime::{
    Completion, MountId, Payload, Request, RequestKind, Runtime, Sequencer, StalePolicy, Ticket,
};

/// Length of the agent-response preview in the episode list.
const EPISODE_PREVIEW_CHARS: usize = 100;

/// The two mutually exclusive memory sub-views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryView {
    #[default]
    Search,
    Episodes,
}

pub struct MemoryController {
    mount: MountId,
    view: MemoryView,
    n_results: u32,
    episode_count: u32,
    last_query: Option<String>,
    memories: Vec<MemoryRecord>,
    episodes: Vec<Episode>,
    search_seq: Sequencer,
    episode_seq: Sequencer,
}

impl MemoryController {
    /// Mount the panel and load recent episodes once.
    pub fn mount(mount: MountId, config: &MemoryConfig, rt: &mut dyn Runtime) -> Self {
        let mut controller = Self {
            mount,
            view: MemoryView::default(),
            n_results: config.search_results,
            episode_count: config.episode_count,
            last_query: None,
            memories: Vec::new(),
            episodes: Vec::new(),
            search_seq: Sequencer::new(StalePolicy::DropSuperseded),
            episode_seq: Sequencer::new(StalePolicy::DropOutOfOrder),
        };
        controller.reload_episodes(rt);
        controller
    }

    /// Run a vector search. Returns `false` (and issues nothing) for a
    /// blank query.
    pub fn search(&mut self, query: &str, rt: &mut dyn Runtime) -> bool {
        if query.trim().is_empty() {
            return false;
        }
        self.last_query = Some(query.to_string());
        rt.issue(Ticket {
            mount: self.mount,
            seq: self.search_seq.next(),
            request: Request::SearchMemory {
                query: query.to_string(),
                n_results: self.n_results,
            },
        });
        true
    }

    pub fn reload_episodes(&mut self, rt: &mut dyn Runtime) {
        rt.issue(Ticket {
            mount: self.mount,
            seq: self.episode_seq.next(),
            request: Request::Episodes {
                n: self.episode_count,
            },
        });
    }

    pub fn set_view(&mut self, view: MemoryView) -> bool {
        let changed = self.view != view;
        self.view = view;
        changed
    }

    pub fn view(&self) -> MemoryView {
        self.view
    }

    pub fn memories(&self) -> &[MemoryRecord] {
        &self.memories
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn view_model(&self) -> MemoryPanel {
        MemoryPanel {
            view: self.view,
            query: self.last_query.clone(),
            memories: self.memories.iter().map(MemoryCard::from_record).collect(),
            episodes: self.episodes.iter().map(EpisodeCard::from_episode).collect(),
        }
    }
}

impl ViewController for MemoryController {
    fn mount_id(&self) -> MountId {
        self.mount
    }

    fn on_completion(&mut self, completion: Completion) -> Applied {
        match (completion.kind, completion.result) {
            (RequestKind::SearchMemory, Ok(Payload::Memories(memories))) => {
                if !self.search_seq.accept(completion.seq) {
                    return Applied::Stale;
                }
                self.memories = memories;
                Applied::Changed
            }
            (RequestKind::Episodes, Ok(Payload::Episodes(episodes))) => {
                if !self.episode_seq.accept(completion.seq) {
                    return Applied::Stale;
                }
                self.episodes = episodes;
                Applied::Changed
            }
            (RequestKind::SearchMemory | RequestKind::Episodes, _) => Applied::Unchanged,
            _ => Applied::Stale,
        }
    }
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// Two-decimal similarity label for a distance: `1 - distance`, unclamped.
pub fn similarity_label(distance: f64) -> String {
    format::fixed(1.0 - distance, 2)
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryPanel {
    pub view: MemoryView,
    pub query: Option<String>,
    pub memories: Vec<MemoryCard>,
    pub episodes: Vec<EpisodeCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryCard {
    pub content: String,
    pub similarity: String,
    pub timestamp: Option<String>,
}

impl MemoryCard {
    fn from_record(record: &MemoryRecord) -> Self {
        Self {
            content: record.content.clone(),
            similarity: similarity_label(record.distance),
            timestamp: record.metadata.timestamp.as_deref().map(format::date_time),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeCard {
    pub user_message: String,
    pub agent_preview: String,
    pub tools_used: Vec<String>,
    pub timestamp: String,
}

impl EpisodeCard {
    fn from_episode(episode: &Episode) -> Self {
        Self {
            user_message: episode.user_message.clone(),
            agent_preview: format::preview(&episode.agent_response, EPISODE_PREVIEW_CHARS),
            tools_used: episode.tools_used.clone(),
            timestamp: format::date_time(&episode.timestamp),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestFailed;
    use crate::api::types::MemoryMetadata;
    use crate::runtime::recording::RecordingRuntime;

    fn record(content: &str, distance: f64) -> MemoryRecord {
        MemoryRecord {
            content: content.to_string(),
            distance,
            metadata: MemoryMetadata::default(),
        }
    }

    fn episode(user: &str) -> Episode {
        Episode {
            user_message: user.to_string(),
            agent_response: "a".repeat(150),
            tools_used: vec![],
            timestamp: "2025-01-31T12:00:00".to_string(),
        }
    }

    fn complete(
        memory: &mut MemoryController,
        ticket: &Ticket,
        result: Result<Payload, RequestFailed>,
    ) -> Applied {
        memory.on_completion(Completion {
            mount: ticket.mount,
            seq: ticket.seq,
            kind: ticket.request.kind(),
            result,
        })
    }

    fn mounted() -> (MemoryController, RecordingRuntime, Ticket) {
        let mut rt = RecordingRuntime::new();
        let memory = MemoryController::mount(MountId(2), &MemoryConfig::default(), &mut rt);
        let episodes = rt.take().pop().unwrap();
        (memory, rt, episodes)
    }

    #[test]
    fn mount_loads_twenty_episodes_once() {
        let (_, rt, ticket) = mounted();
        assert_eq!(ticket.request, Request::Episodes { n: 20 });
        assert!(rt.tickets.is_empty());
        assert!(rt.timers.is_empty(), "episodes are not polled");
    }

    #[test]
    fn blank_query_is_a_noop() {
        let (mut memory, mut rt, _) = mounted();
        assert!(!memory.search("   ", &mut rt));
        assert!(rt.tickets.is_empty());
        assert_eq!(memory.last_query(), None);
    }

    #[test]
    fn search_requests_ten_results_and_replaces_list() {
        let (mut memory, mut rt, _) = mounted();
        assert!(memory.search("rust", &mut rt));
        let first = rt.take().pop().unwrap();
        assert_eq!(
            first.request,
            Request::SearchMemory {
                query: "rust".into(),
                n_results: 10
            }
        );
        complete(&mut memory, &first, Ok(Payload::Memories(vec![record("a", 0.1), record("b", 0.2)])));
        assert_eq!(memory.memories().len(), 2);

        memory.search("go", &mut rt);
        let second = rt.take().pop().unwrap();
        complete(&mut memory, &second, Ok(Payload::Memories(vec![record("c", 0.4)])));
        assert_eq!(memory.memories(), &[record("c", 0.4)], "no merge with the old list");
    }

    #[test]
    fn failed_search_keeps_previous_results() {
        let (mut memory, mut rt, _) = mounted();
        memory.search("rust", &mut rt);
        let ok = rt.take().pop().unwrap();
        complete(&mut memory, &ok, Ok(Payload::Memories(vec![record("kept", 0.3)])));

        memory.search("again", &mut rt);
        let failing = rt.take().pop().unwrap();
        let applied = complete(
            &mut memory,
            &failing,
            Err(RequestFailed::new("POST", "/memory/query", "HTTP 500")),
        );
        assert_eq!(applied, Applied::Unchanged);
        assert_eq!(memory.memories(), &[record("kept", 0.3)]);
    }

    #[test]
    fn superseded_search_is_discarded() {
        let (mut memory, mut rt, _) = mounted();
        memory.search("old", &mut rt);
        memory.search("new", &mut rt);
        let tickets = rt.take();

        let applied = complete(&mut memory, &tickets[1], Ok(Payload::Memories(vec![record("new", 0.1)])));
        assert_eq!(applied, Applied::Changed);
        let applied = complete(&mut memory, &tickets[0], Ok(Payload::Memories(vec![record("old", 0.1)])));
        assert_eq!(applied, Applied::Stale);
        assert_eq!(memory.memories()[0].content, "new");
    }

    #[test]
    fn failed_episode_load_keeps_list() {
        let (mut memory, mut rt, first) = mounted();
        complete(&mut memory, &first, Ok(Payload::Episodes(vec![episode("hi")])));
        memory.reload_episodes(&mut rt);
        let second = rt.take().pop().unwrap();
        complete(
            &mut memory,
            &second,
            Err(RequestFailed::new("GET", "/memory/episodes?n=20", "timeout")),
        );
        assert_eq!(memory.episodes().len(), 1);
    }

    #[test]
    fn view_toggle_reports_changes() {
        let (mut memory, _, _) = mounted();
        assert_eq!(memory.view(), MemoryView::Search);
        assert!(memory.set_view(MemoryView::Episodes));
        assert!(!memory.set_view(MemoryView::Episodes));
    }

    #[test]
    fn similarity_renders_two_decimals() {
        assert_eq!(similarity_label(0.3), "0.70");
        assert_eq!(similarity_label(0.0), "1.00");
        assert_eq!(similarity_label(1.25), "-0.25", "no client-side clamping");
    }

    #[test]
    fn view_model_previews_agent_responses() {
        let (mut memory, _, first) = mounted();
        complete(&mut memory, &first, Ok(Payload::Episodes(vec![episode("hi")])));
        let panel = memory.view_model();
        assert_eq!(panel.episodes[0].agent_preview.chars().count(), 103);
        assert!(panel.episodes[0].agent_preview.ends_with("..."));
    }
}
