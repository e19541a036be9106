//! Stats side panel, always visible, polled.

use std::time::Duration;

use serde::Serialize;

use super::format;
use super::{Applied, ViewController};
use crate::api::types::StatsSnapshot;
use crate::runtime::{
    Completion, MountId, Payload, PollHandle, PollTarget, Request, RequestKind, Runtime,
    Sequencer, StalePolicy, Ticket,
};

/// How many top skills the panel lists.
const TOP_SKILLS_SHOWN: usize = 3;

pub struct StatsController {
    mount: MountId,
    snapshot: Option<StatsSnapshot>,
    seq: Sequencer,
    _poll: PollHandle,
}

impl StatsController {
    /// Mount, fetch immediately, and refresh every `interval` until dropped.
    pub fn mount(mount: MountId, interval: Duration, rt: &mut dyn Runtime) -> Self {
        let poll = rt.every(interval, mount, PollTarget::Stats);
        let mut controller = Self {
            mount,
            snapshot: None,
            seq: Sequencer::new(StalePolicy::DropOutOfOrder),
            _poll: poll,
        };
        controller.refresh(rt);
        controller
    }

    pub fn refresh(&mut self, rt: &mut dyn Runtime) {
        rt.issue(Ticket {
            mount: self.mount,
            seq: self.seq.next(),
            request: Request::Stats,
        });
    }

    /// `None` until the first successful response.
    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn view_model(&self) -> StatsPanel {
        let Some(stats) = &self.snapshot else {
            return StatsPanel::Loading;
        };
        let learning = &stats.learning_stats;

        let avg_skill = (learning.avg_skill_level > 0.0).then(|| AvgSkillBar {
            level: format::fixed(learning.avg_skill_level, 1),
            percent: format::level_percent(learning.avg_skill_level),
        });

        StatsPanel::Ready {
            cards: vec![
                StatCard::new("Vector Memories", stats.vector_memories),
                StatCard::new("Episodes", stats.episodes),
                StatCard::new("Patterns", learning.total_patterns),
                StatCard::new("Skills", learning.total_skills),
            ],
            avg_skill,
            top_skills: learning
                .top_skills
                .iter()
                .take(TOP_SKILLS_SHOWN)
                .map(|(name, skill)| TopSkill {
                    name: name.clone(),
                    level: format::level_number(skill.level),
                })
                .collect(),
        }
    }
}

impl ViewController for StatsController {
    fn mount_id(&self) -> MountId {
        self.mount
    }

    fn on_completion(&mut self, completion: Completion) -> Applied {
        match (completion.kind, completion.result) {
            (RequestKind::Stats, Ok(Payload::Stats(snapshot))) => {
                if !self.seq.accept(completion.seq) {
                    return Applied::Stale;
                }
                self.snapshot = Some(snapshot);
                Applied::Changed
            }
            (RequestKind::Stats, _) => Applied::Unchanged,
            _ => Applied::Stale,
        }
    }

    fn on_tick(&mut self, target: PollTarget, rt: &mut dyn Runtime) {
        if target == PollTarget::Stats {
            self.refresh(rt);
        }
    }
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StatsPanel {
    Loading,
    Ready {
        cards: Vec<StatCard>,
        /// Present only when the average level is above zero.
        avg_skill: Option<AvgSkillBar>,
        /// At most three; empty means the section is hidden.
        top_skills: Vec<TopSkill>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: u64,
}

impl StatCard {
    fn new(label: &'static str, value: u64) -> Self {
        Self { label, value }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgSkillBar {
    pub level: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopSkill {
    pub name: String,
    pub level: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestFailed;
    use crate::api::types::{LearningStats, Skill};
    use std::sync::Arc;
    use std::time::Instant;

    use crate::api::fake::FakeBackend;
    use crate::runtime::recording::RecordingRuntime;
    use crate::runtime::{Dispatcher, Event};

    fn snapshot(avg: f64, top: usize) -> StatsSnapshot {
        StatsSnapshot {
            vector_memories: 12,
            episodes: 5,
            learning_stats: LearningStats {
                total_patterns: 3,
                total_skills: top as u64,
                avg_skill_level: avg,
                top_skills: (0..top)
                    .map(|i| {
                        (
                            format!("skill{i}"),
                            Skill {
                                level: 9.0 - i as f64,
                                uses: 1,
                                success_rate: 1.0,
                            },
                        )
                    })
                    .collect(),
            },
        }
    }

    fn complete(stats: &mut StatsController, seq: u64, result: Result<Payload, RequestFailed>) -> Applied {
        stats.on_completion(Completion {
            mount: stats.mount_id(),
            seq,
            kind: RequestKind::Stats,
            result,
        })
    }

    #[test]
    fn loading_until_first_success() {
        let mut rt = RecordingRuntime::new();
        let mut stats = StatsController::mount(MountId(1), Duration::from_secs(5), &mut rt);
        assert_eq!(rt.requests(), vec![Request::Stats]);
        assert!(matches!(stats.view_model(), StatsPanel::Loading));

        complete(&mut stats, 1, Err(RequestFailed::new("GET", "/memory/stats", "refused")));
        assert!(matches!(stats.view_model(), StatsPanel::Loading), "no zero-state on failure");
    }

    #[test]
    fn ready_panel_has_four_cards() {
        let mut rt = RecordingRuntime::new();
        let mut stats = StatsController::mount(MountId(1), Duration::from_secs(5), &mut rt);
        complete(&mut stats, 1, Ok(Payload::Stats(snapshot(4.25, 5))));

        let StatsPanel::Ready { cards, avg_skill, top_skills } = stats.view_model() else {
            panic!("expected ready panel");
        };
        assert_eq!(
            cards,
            vec![
                StatCard::new("Vector Memories", 12),
                StatCard::new("Episodes", 5),
                StatCard::new("Patterns", 3),
                StatCard::new("Skills", 5),
            ]
        );
        let avg = avg_skill.unwrap();
        assert_eq!(avg.level, "4.3");
        assert_eq!(avg.percent, 42.5);
        assert_eq!(top_skills.len(), 3);
        assert_eq!(top_skills[0].name, "skill0");
        assert_eq!(top_skills[0].level, "9");
    }

    #[test]
    fn zero_average_and_no_skills_hide_sections() {
        let mut rt = RecordingRuntime::new();
        let mut stats = StatsController::mount(MountId(1), Duration::from_secs(5), &mut rt);
        complete(&mut stats, 1, Ok(Payload::Stats(snapshot(0.0, 0))));
        let StatsPanel::Ready { avg_skill, top_skills, .. } = stats.view_model() else {
            panic!("expected ready panel");
        };
        assert!(avg_skill.is_none());
        assert!(top_skills.is_empty());
    }

    #[test]
    fn failure_keeps_last_snapshot() {
        let mut rt = RecordingRuntime::new();
        let mut stats = StatsController::mount(MountId(1), Duration::from_secs(5), &mut rt);
        complete(&mut stats, 1, Ok(Payload::Stats(snapshot(2.0, 1))));
        stats.on_tick(PollTarget::Stats, &mut rt);
        complete(&mut stats, 2, Err(RequestFailed::new("GET", "/memory/stats", "HTTP 500")));
        assert_eq!(stats.snapshot().unwrap().vector_memories, 12);
    }

    #[test]
    fn drop_cancels_timer() {
        let mut rt = RecordingRuntime::new();
        let stats = StatsController::mount(MountId(2), Duration::from_secs(5), &mut rt);
        assert_eq!(rt.timers.len(), 1);
        assert_eq!(rt.timers[0].target, PollTarget::Stats);
        assert_eq!(rt.timers[0].interval, Duration::from_secs(5));
        assert!(!rt.timers[0].is_cancelled());

        drop(stats);
        assert!(rt.timers[0].is_cancelled());
    }

    #[test]
    fn no_ticks_after_teardown() {
        let backend = FakeBackend::new().with("GET", "/memory/stats", serde_json::to_value(snapshot(1.0, 1)).unwrap());
        let (mut dispatcher, events) = Dispatcher::new(Arc::new(backend));
        let stats = StatsController::mount(MountId(2), Duration::from_millis(20), &mut dispatcher);

        // At least one tick proves the timer was live.
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut ticked = false;
        while !ticked && Instant::now() < deadline {
            if let Ok(Event::Tick { mount, .. }) = events.recv_timeout(Duration::from_millis(100)) {
                ticked = mount == MountId(2);
            }
        }
        assert!(ticked);

        drop(stats);
        std::thread::sleep(Duration::from_millis(100));
        while events.try_recv().is_ok() {}

        assert!(
            !matches!(events.recv_timeout(Duration::from_millis(200)), Ok(Event::Tick { .. })),
            "stats timer kept ticking after teardown"
        );
    }

    #[test]
    fn ticks_for_other_targets_are_ignored() {
        let mut rt = RecordingRuntime::new();
        let mut stats = StatsController::mount(MountId(1), Duration::from_secs(5), &mut rt);
        rt.take();
        stats.on_tick(PollTarget::Learning, &mut rt);
        assert!(rt.tickets.is_empty());
        stats.on_tick(PollTarget::Stats, &mut rt);
        assert_eq!(rt.requests(), vec![Request::Stats]);
    }
}
