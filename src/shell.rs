//! The dashboard shell: connection monitor, the always-visible stats panel,
//! and exactly one active tab.
//!
//! The shell is the single owner of all view state. Every [`Event`] passes
//! through [`Shell::handle`], which routes it by [`MountId`] and records the
//! request outcome in the activity log. Events for mounts that are gone are
//! dropped.

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityEvent, ActivityLog, Outcome};
use crate::config::schema::{DashConfig, MemoryConfig, PollingConfig};
use crate::monitor::{ConnectionMonitor, ConnectionState};
use crate::runtime::{Completion, Event, MountId, Runtime};
use crate::views::chat::{ChatController, ChatPanel, SendOutcome};
use crate::views::learning::{LearningController, LearningPanel};
use crate::views::memory::{MemoryController, MemoryPanel, MemoryView};
use crate::views::stats::{StatsController, StatsPanel};
use crate::views::tools::{ToolsController, ToolsPanel};
use crate::views::{Applied, ViewController};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Chat,
    Memory,
    Learning,
    Tools,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Chat, Tab::Memory, Tab::Learning, Tab::Tools];

    pub fn label(self) -> &'static str {
        match self {
            Self::Chat => "Chat",
            Self::Memory => "Memory",
            Self::Learning => "Learning",
            Self::Tools => "Tools",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.label().eq_ignore_ascii_case(name.trim()))
    }
}

/// The mounted controller behind the active tab.
pub enum ActivePanel {
    Chat(ChatController),
    Memory(MemoryController),
    Learning(LearningController),
    Tools(ToolsController),
}

impl ActivePanel {
    fn mount(
        tab: Tab,
        mount: MountId,
        polling: &PollingConfig,
        memory: &MemoryConfig,
        rt: &mut dyn Runtime,
    ) -> Self {
        match tab {
            Tab::Chat => Self::Chat(ChatController::mount(mount)),
            Tab::Memory => Self::Memory(MemoryController::mount(mount, memory, rt)),
            Tab::Learning => {
                Self::Learning(LearningController::mount(mount, polling.learning_interval(), rt))
            }
            Tab::Tools => Self::Tools(ToolsController::mount(mount, rt)),
        }
    }

    pub fn tab(&self) -> Tab {
        match self {
            Self::Chat(_) => Tab::Chat,
            Self::Memory(_) => Tab::Memory,
            Self::Learning(_) => Tab::Learning,
            Self::Tools(_) => Tab::Tools,
        }
    }

    fn controller_mut(&mut self) -> &mut dyn ViewController {
        match self {
            Self::Chat(c) => c,
            Self::Memory(c) => c,
            Self::Learning(c) => c,
            Self::Tools(c) => c,
        }
    }

    pub fn mount_id(&self) -> MountId {
        match self {
            Self::Chat(c) => c.mount_id(),
            Self::Memory(c) => c.mount_id(),
            Self::Learning(c) => c.mount_id(),
            Self::Tools(c) => c.mount_id(),
        }
    }

    fn snapshot(&self) -> PanelSnapshot {
        match self {
            Self::Chat(c) => PanelSnapshot::Chat(c.view_model()),
            Self::Memory(c) => PanelSnapshot::Memory(c.view_model()),
            Self::Learning(c) => PanelSnapshot::Learning(c.view_model()),
            Self::Tools(c) => PanelSnapshot::Tools(c.view_model()),
        }
    }
}

pub struct Shell {
    polling: PollingConfig,
    memory_config: MemoryConfig,
    log: ActivityLog,
    last_mount: u64,
    monitor: ConnectionMonitor,
    stats: StatsController,
    active: ActivePanel,
}

impl Shell {
    /// Mount the monitor, the stats panel and the default tab.
    pub fn mount(config: &DashConfig, log: ActivityLog, rt: &mut dyn Runtime) -> Self {
        let monitor = ConnectionMonitor::mount(MountId(1), rt);
        let stats = StatsController::mount(MountId(2), config.polling.stats_interval(), rt);
        let active = ActivePanel::mount(
            Tab::default(),
            MountId(3),
            &config.polling,
            &config.memory,
            rt,
        );
        Self {
            polling: config.polling.clone(),
            memory_config: config.memory.clone(),
            log,
            last_mount: 3,
            monitor,
            stats,
            active,
        }
    }

    fn next_mount(&mut self) -> MountId {
        self.last_mount += 1;
        MountId(self.last_mount)
    }

    /// Switch tabs. Selecting the active tab does nothing and returns `false`.
    pub fn select(&mut self, tab: Tab, rt: &mut dyn Runtime) -> bool {
        if self.active.tab() == tab {
            return false;
        }
        self.replace_panel(tab, rt);
        true
    }

    /// Tear down and remount the active tab, and re-check the backend.
    pub fn refresh(&mut self, rt: &mut dyn Runtime) {
        let mount = self.next_mount();
        self.monitor = ConnectionMonitor::mount(mount, rt);
        self.stats.refresh(rt);
        self.replace_panel(self.active.tab(), rt);
    }

    fn replace_panel(&mut self, tab: Tab, rt: &mut dyn Runtime) {
        let mount = self.next_mount();
        // Chat mounts inert, so it stands in while the old panel is torn down.
        self.active = ActivePanel::Chat(ChatController::mount(mount));
        if tab != Tab::Chat {
            self.active = ActivePanel::mount(tab, mount, &self.polling, &self.memory_config, rt);
        }
    }

    /// Apply one event. Returns `true` when anything visible changed.
    pub fn handle(&mut self, event: Event, rt: &mut dyn Runtime) -> bool {
        match event {
            Event::Completed(completion) => self.complete(completion),
            Event::Tick { mount, target } => {
                if mount == self.stats.mount_id() {
                    self.stats.on_tick(target, rt);
                } else if mount == self.active.mount_id() {
                    self.active.controller_mut().on_tick(target, rt);
                }
                false
            }
            Event::Input(_) | Event::InputClosed => false,
        }
    }

    fn complete(&mut self, completion: Completion) -> bool {
        let request = completion.kind.label();
        let failure = completion.result.as_ref().err().map(ToString::to_string);

        let mount = completion.mount;
        let (view, controller): (&str, &mut dyn ViewController) = if mount
            == self.monitor.mount_id()
        {
            ("monitor", &mut self.monitor)
        } else if mount == self.stats.mount_id() {
            ("stats", &mut self.stats)
        } else if mount == self.active.mount_id() {
            let view = view_name(self.active.tab());
            (view, self.active.controller_mut())
        } else {
            self.log
                .record(&ActivityEvent::new("-", request, Outcome::Dropped, failure));
            return false;
        };

        let applied = controller.on_completion(completion);
        let outcome = match (applied, &failure) {
            (Applied::Stale, _) => Outcome::Stale,
            (_, Some(_)) => Outcome::Failed,
            _ => Outcome::Ok,
        };
        if outcome != Outcome::Ok {
            self.log
                .record(&ActivityEvent::new(view, request, outcome, failure));
        }
        applied == Applied::Changed
    }

    /// Send a chat message. `None` when the Chat tab is not active.
    pub fn send_chat(&mut self, text: &str, rt: &mut dyn Runtime) -> Option<SendOutcome> {
        match &mut self.active {
            ActivePanel::Chat(chat) => Some(chat.send(text, rt)),
            _ => None,
        }
    }

    /// Run a memory search. `false` when the Memory tab is not active or the
    /// query is blank.
    pub fn search_memory(&mut self, query: &str, rt: &mut dyn Runtime) -> bool {
        match &mut self.active {
            ActivePanel::Memory(memory) => memory.search(query, rt),
            _ => false,
        }
    }

    pub fn set_memory_view(&mut self, view: MemoryView) -> bool {
        match &mut self.active {
            ActivePanel::Memory(memory) => memory.set_view(view),
            _ => false,
        }
    }

    pub fn tab(&self) -> Tab {
        self.active.tab()
    }

    pub fn active(&self) -> &ActivePanel {
        &self.active
    }

    pub fn connection(&self) -> ConnectionState {
        self.monitor.state()
    }

    pub fn stats(&self) -> &StatsController {
        &self.stats
    }

    pub fn snapshot(&self) -> ShellSnapshot {
        let connection = self.monitor.state();
        ShellSnapshot {
            connection,
            connection_label: connection.label(),
            tab: self.active.tab(),
            panel: self.active.snapshot(),
            stats: self.stats.view_model(),
        }
    }
}

fn view_name(tab: Tab) -> &'static str {
    match tab {
        Tab::Chat => "chat",
        Tab::Memory => "memory",
        Tab::Learning => "learning",
        Tab::Tools => "tools",
    }
}

/// Serializable view of the whole dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ShellSnapshot {
    pub connection: ConnectionState,
    pub connection_label: &'static str,
    pub tab: Tab,
    pub panel: PanelSnapshot,
    pub stats: StatsPanel,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum PanelSnapshot {
    Chat(ChatPanel),
    Memory(MemoryPanel),
    Learning(LearningPanel),
    Tools(ToolsPanel),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::api::RequestFailed;
    use crate::api::types::{LearningStats, StatsSnapshot};
    use crate::runtime::recording::RecordingRuntime;
    use crate::runtime::{Payload, PollTarget, Request, Ticket};

    fn shell() -> (Shell, RecordingRuntime) {
        let mut rt = RecordingRuntime::new();
        let shell = Shell::mount(&DashConfig::default(), ActivityLog::disabled(), &mut rt);
        (shell, rt)
    }

    fn complete(ticket: &Ticket, result: Result<Payload, RequestFailed>) -> Event {
        Event::Completed(Completion {
            mount: ticket.mount,
            seq: ticket.seq,
            kind: ticket.request.kind(),
            result,
        })
    }

    fn stats_payload() -> Payload {
        Payload::Stats(StatsSnapshot {
            vector_memories: 1,
            episodes: 1,
            learning_stats: LearningStats {
                total_patterns: 0,
                total_skills: 0,
                avg_skill_level: 0.0,
                top_skills: vec![],
            },
        })
    }

    #[test]
    fn mount_checks_health_and_loads_stats() {
        let (shell, rt) = shell();
        assert_eq!(shell.tab(), Tab::Chat);
        assert_eq!(rt.requests(), vec![Request::Health, Request::Stats]);
        assert_eq!(rt.timers.len(), 1);
        assert_eq!(rt.timers[0].target, PollTarget::Stats);
        assert_eq!(shell.connection(), ConnectionState::Unknown);
    }

    #[test]
    fn health_completion_updates_connection() {
        let (mut shell, mut rt) = shell();
        let tickets = rt.take();
        assert!(shell.handle(complete(&tickets[0], Ok(Payload::Health)), &mut rt));
        assert_eq!(shell.connection(), ConnectionState::Connected);
    }

    #[test]
    fn selecting_active_tab_is_a_noop() {
        let (mut shell, mut rt) = shell();
        rt.take();
        assert!(!shell.select(Tab::Chat, &mut rt));
        assert!(rt.tickets.is_empty());
    }

    #[test]
    fn polling_stops_after_switching_away() {
        let (mut shell, mut rt) = shell();
        assert!(shell.select(Tab::Learning, &mut rt));
        let learning_timer = rt.timers.len() - 1;
        let learning_mount = rt.timers[learning_timer].mount;
        assert!(!rt.timers[learning_timer].is_cancelled());

        shell.select(Tab::Tools, &mut rt);
        assert!(rt.timers[learning_timer].is_cancelled());
        rt.take();

        // A tick already queued for the torn-down panel issues nothing.
        shell.handle(
            Event::Tick {
                mount: learning_mount,
                target: PollTarget::Learning,
            },
            &mut rt,
        );
        assert!(rt.tickets.is_empty());
    }

    #[test]
    fn stats_keep_polling_across_tabs() {
        let (mut shell, mut rt) = shell();
        let stats_mount = shell.stats().mount_id();
        shell.select(Tab::Memory, &mut rt);
        rt.take();
        shell.handle(
            Event::Tick {
                mount: stats_mount,
                target: PollTarget::Stats,
            },
            &mut rt,
        );
        assert_eq!(rt.requests(), vec![Request::Stats]);
    }

    #[test]
    fn late_completion_for_dead_mount_is_dropped() {
        let (mut shell, mut rt) = shell();
        shell.select(Tab::Memory, &mut rt);
        let episodes = rt.take().pop().unwrap();
        shell.select(Tab::Chat, &mut rt);
        let changed = shell.handle(complete(&episodes, Ok(Payload::Episodes(vec![]))), &mut rt);
        assert!(!changed);
        assert_eq!(shell.tab(), Tab::Chat);
    }

    #[test]
    fn chat_transcript_does_not_survive_tab_switch() {
        let (mut shell, mut rt) = shell();
        assert_eq!(shell.send_chat("hello", &mut rt), Some(SendOutcome::Dispatched));
        shell.select(Tab::Tools, &mut rt);
        shell.select(Tab::Chat, &mut rt);
        let ActivePanel::Chat(chat) = shell.active() else {
            panic!("chat should be active");
        };
        assert!(chat.transcript().is_empty());
    }

    #[test]
    fn actions_for_inactive_tabs_are_refused() {
        let (mut shell, mut rt) = shell();
        rt.take();
        assert!(!shell.search_memory("rust", &mut rt));
        assert!(!shell.set_memory_view(MemoryView::Episodes));
        shell.select(Tab::Memory, &mut rt);
        assert_eq!(shell.send_chat("hi", &mut rt), None);
    }

    #[test]
    fn refresh_remounts_active_tab() {
        let (mut shell, mut rt) = shell();
        shell.select(Tab::Learning, &mut rt);
        let old_mount = shell.active().mount_id();
        rt.take();
        shell.refresh(&mut rt);
        assert_ne!(shell.active().mount_id(), old_mount);
        assert_eq!(
            rt.requests(),
            vec![Request::Health, Request::Stats, Request::Patterns, Request::Skills]
        );
    }

    #[test]
    fn outcomes_are_logged() {
        let dir = std::env::temp_dir().join(format!("nexus-dash-shell-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let log = ActivityLog::at(dir.join("activity.jsonl"));

        let mut rt = RecordingRuntime::new();
        let mut shell = Shell::mount(&DashConfig::default(), log.clone(), &mut rt);
        let tickets = rt.take();
        shell.handle(complete(&tickets[1], Ok(stats_payload())), &mut rt);

        shell.select(Tab::Memory, &mut rt);
        shell.search_memory("rust", &mut rt);
        let search = rt.take().pop().unwrap();
        shell.handle(
            complete(&search, Err(RequestFailed::new("POST", "/memory/query", "HTTP 500"))),
            &mut rt,
        );

        let events = log.read_recent(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].view, "memory");
        assert_eq!(events[0].outcome, Outcome::Failed);
        assert!(events[0].detail.as_deref().unwrap().contains("HTTP 500"));
    }

    #[test]
    fn successful_polls_leave_the_log_alone() {
        let dir = std::env::temp_dir().join(format!("nexus-dash-idle-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let log = ActivityLog::at(dir.join("activity.jsonl"));

        let mut rt = RecordingRuntime::new();
        let mut shell = Shell::mount(&DashConfig::default(), log.clone(), &mut rt);
        rt.take();

        // An hour of idle stats polling at the default interval.
        let stats_mount = shell.stats.mount_id();
        for _ in 0..720 {
            shell.handle(
                Event::Tick {
                    mount: stats_mount,
                    target: PollTarget::Stats,
                },
                &mut rt,
            );
            let tick = rt.take().pop().unwrap();
            shell.handle(complete(&tick, Ok(stats_payload())), &mut rt);
        }

        assert!(shell.stats().snapshot().is_some());
        assert_eq!(log.entry_count(), 0);
        assert!(log.read_recent(10).is_empty());
    }

    #[test]
    fn snapshot_serializes_active_panel() {
        let (mut shell, mut rt) = shell();
        shell.select(Tab::Tools, &mut rt);
        let json = serde_json::to_value(shell.snapshot()).unwrap();
        assert_eq!(json["tab"], "tools");
        assert_eq!(json["panel"]["kind"], "tools");
        assert_eq!(json["panel"]["data"]["state"], "loading");
        assert_eq!(json["stats"]["state"], "loading");
        assert_eq!(json["connection"], "unknown");
    }

    #[test]
    fn tab_names_parse_case_insensitively() {
        assert_eq!(Tab::parse("memory"), Some(Tab::Memory));
        assert_eq!(Tab::parse(" Tools "), Some(Tab::Tools));
        assert_eq!(Tab::parse("settings"), None);
    }
}
