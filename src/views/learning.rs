//! Learning panel: detected patterns and learned skills, polled.
//!
//! Patterns and skills are fetched as two independent requests each round;
//! one failing never blocks or clears the other.

use std::time::Duration;

use serde::Serialize;

use super::format;
use super::{Applied, ViewController};
use crate::api::types::{NamedSkill, Pattern};
use crate::runtime::{
    Completion, MountId, Payload, PollHandle, PollTarget, Request, RequestKind, Runtime,
    Sequencer, StalePolicy, Ticket,
};

/// Skill proficiency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkillTier {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillTier {
    /// Inclusive lower bounds, highest first.
    pub fn from_level(level: f64) -> Self {
        if level >= 8.0 {
            Self::Expert
        } else if level >= 5.0 {
            Self::Advanced
        } else if level >= 3.0 {
            Self::Intermediate
        } else {
            Self::Beginner
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
        }
    }
}

impl std::fmt::Display for SkillTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub struct LearningController {
    mount: MountId,
    patterns: Vec<Pattern>,
    skills: Vec<NamedSkill>,
    pattern_seq: Sequencer,
    skill_seq: Sequencer,
    _poll: PollHandle,
}

impl LearningController {
    /// Mount, fetch immediately, and refresh every `interval` until dropped.
    pub fn mount(mount: MountId, interval: Duration, rt: &mut dyn Runtime) -> Self {
        let poll = rt.every(interval, mount, PollTarget::Learning);
        let mut controller = Self {
            mount,
            patterns: Vec::new(),
            skills: Vec::new(),
            pattern_seq: Sequencer::new(StalePolicy::DropOutOfOrder),
            skill_seq: Sequencer::new(StalePolicy::DropOutOfOrder),
            _poll: poll,
        };
        controller.refresh(rt);
        controller
    }

    /// Issue one patterns request and one skills request.
    pub fn refresh(&mut self, rt: &mut dyn Runtime) {
        rt.issue(Ticket {
            mount: self.mount,
            seq: self.pattern_seq.next(),
            request: Request::Patterns,
        });
        rt.issue(Ticket {
            mount: self.mount,
            seq: self.skill_seq.next(),
            request: Request::Skills,
        });
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn skills(&self) -> &[NamedSkill] {
        &self.skills
    }

    pub fn view_model(&self) -> LearningPanel {
        LearningPanel {
            patterns: self
                .patterns
                .iter()
                .map(|p| PatternCard {
                    keywords: p.keywords.clone(),
                    frequency: p.frequency,
                    last_seen: format::date_time(&p.last_seen),
                })
                .collect(),
            skills: self
                .skills
                .iter()
                .map(|s| {
                    let tier = SkillTier::from_level(s.skill.level);
                    SkillCard {
                        name: s.name.clone(),
                        tier,
                        tier_label: tier.label(),
                        level: format::level_number(s.skill.level),
                        bar_percent: format::level_percent(s.skill.level),
                        uses: s.skill.uses,
                        success: format::rate_percent(s.skill.success_rate),
                    }
                })
                .collect(),
        }
    }
}

impl ViewController for LearningController {
    fn mount_id(&self) -> MountId {
        self.mount
    }

    fn on_completion(&mut self, completion: Completion) -> Applied {
        match (completion.kind, completion.result) {
            (RequestKind::Patterns, Ok(Payload::Patterns(patterns))) => {
                if !self.pattern_seq.accept(completion.seq) {
                    return Applied::Stale;
                }
                self.patterns = patterns;
                Applied::Changed
            }
            (RequestKind::Skills, Ok(Payload::Skills(skills))) => {
                if !self.skill_seq.accept(completion.seq) {
                    return Applied::Stale;
                }
                self.skills = skills;
                Applied::Changed
            }
            (RequestKind::Patterns | RequestKind::Skills, _) => Applied::Unchanged,
            _ => Applied::Stale,
        }
    }

    fn on_tick(&mut self, target: PollTarget, rt: &mut dyn Runtime) {
        if target == PollTarget::Learning {
            self.refresh(rt);
        }
    }
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct LearningPanel {
    pub patterns: Vec<PatternCard>,
    pub skills: Vec<SkillCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternCard {
    pub keywords: Vec<String>,
    pub frequency: u64,
    pub last_seen: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillCard {
    pub name: String,
    pub tier: SkillTier,
    pub tier_label: &'static str,
    pub level: String,
    pub bar_percent: f64,
    pub uses: u64,
    pub success: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
