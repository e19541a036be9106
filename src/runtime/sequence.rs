/// How a [`Sequencer`] decides that a response is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePolicy {
    /// Only the most recently issued request may apply. For user-driven
    /// requests where the newest intent wins (memory search).
    DropSuperseded,
    /// A response applies if it is newer than the last applied one. For
    /// polls, where a slow backend must not starve the view.
    DropOutOfOrder,
}

/// Monotonic request numbering for one request kind of one controller.
#[derive(Debug, Clone)]
pub struct Sequencer {
    policy: StalePolicy,
    issued: u64,
    applied: u64,
}

impl Sequencer {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            issued: 0,
            applied: 0,
        }
    }

    /// Number the next request.
    pub fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Whether a response for `seq` may still change the view.
    pub fn is_current(&self, seq: u64) -> bool {
        match self.policy {
            StalePolicy::DropSuperseded => seq == self.issued && seq > self.applied,
            StalePolicy::DropOutOfOrder => seq > self.applied && seq <= self.issued,
        }
    }

    /// Record a successful response. Returns `false` if it is stale.
    pub fn accept(&mut self, seq: u64) -> bool {
        if !self.is_current(seq) {
            return false;
        }
        self.applied = seq;
        true
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_responses_are_dropped() {
        let mut seq = Sequencer::new(StalePolicy::DropSuperseded);
        let first = seq.next();
        let second = seq.next();
        assert!(!seq.accept(first));
        assert!(seq.accept(second));
        assert!(!seq.accept(second), "a response applies once");
    }

    #[test]
    fn out_of_order_responses_are_dropped() {
        let mut seq = Sequencer::new(StalePolicy::DropOutOfOrder);
        let first = seq.next();
        let second = seq.next();
        let third = seq.next();
        // Second resolves before first: first must not overwrite it.
        assert!(seq.accept(second));
        assert!(!seq.accept(first));
        // An older poll still applies if nothing newer has landed.
        assert!(seq.accept(third));
    }

    #[test]
    fn slow_polls_still_apply() {
        let mut seq = Sequencer::new(StalePolicy::DropOutOfOrder);
        let first = seq.next();
        let _second = seq.next();
        assert!(seq.accept(first), "newest applied so far, not newest issued");
    }

    #[test]
    fn unknown_sequence_is_rejected() {
        let mut seq = Sequencer::new(StalePolicy::DropOutOfOrder);
        assert!(!seq.accept(1));
        assert_eq!(seq.issued(), 0);
    }
}
