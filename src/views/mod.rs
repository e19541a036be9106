//! View controllers: one per dashboard panel.
//!
//! A controller owns its panel's state, issues its own requests through a
//! [`Runtime`], and turns completions into view state. List-typed state is
//! always replaced wholesale by a successful response and left untouched by
//! a failed one, so a panel reflects exactly one server snapshot.
//!
//! Teardown is dropping the controller: any [`PollHandle`](crate::runtime::PollHandle)
//! it owns stops its timer.

pub mod chat;
pub mod format;
pub mod learning;
pub mod memory;
pub mod stats;
pub mod tools;

use crate::runtime::{Completion, MountId, PollTarget, Runtime};

/// What a completion did to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// View state changed.
    Changed,
    /// Accepted but nothing visible changed (e.g. a failure that keeps the
    /// previous data).
    Unchanged,
    /// Discarded: superseded or out of order.
    Stale,
}

pub trait ViewController {
    fn mount_id(&self) -> MountId;

    fn on_completion(&mut self, completion: Completion) -> Applied;

    fn on_tick(&mut self, _target: PollTarget, _rt: &mut dyn Runtime) {}
}
