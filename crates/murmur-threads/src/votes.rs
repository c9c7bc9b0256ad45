use std::collections::HashMap;

use uuid::Uuid;

use murmur_types::models::{VoteKind, VoteTally};

/// Result of a toggle: the voter's vote after the call, and the comment's
/// new tally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteOutcome {
    pub vote: Option<VoteKind>,
    pub tally: VoteTally,
}

/// Per-comment votes, at most one per voter. Kept beside the comment tree
/// rather than inside `Comment` values so handed-out snapshots stay
/// immutable.
#[derive(Debug, Default)]
pub struct VoteLedger {
    by_comment: HashMap<Uuid, HashMap<Uuid, VoteKind>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a vote: voting the current direction again clears it, any
    /// other direction replaces it. Returns the voter's resulting vote.
    pub fn toggle(&mut self, comment_id: Uuid, voter_id: Uuid, kind: VoteKind) -> Option<VoteKind> {
        let votes = self.by_comment.entry(comment_id).or_default();
        match votes.get(&voter_id) {
            Some(current) if *current == kind => {
                votes.remove(&voter_id);
                None
            }
            _ => {
                votes.insert(voter_id, kind);
                Some(kind)
            }
        }
    }

    pub fn tally(&self, comment_id: Uuid) -> VoteTally {
        let mut tally = VoteTally::default();
        if let Some(votes) = self.by_comment.get(&comment_id) {
            for kind in votes.values() {
                match kind {
                    VoteKind::Up => tally.up += 1,
                    VoteKind::Down => tally.down += 1,
                }
            }
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_clears_and_switches() {
        let mut ledger = VoteLedger::new();
        let comment = Uuid::new_v4();
        let voter = Uuid::new_v4();

        assert_eq!(ledger.toggle(comment, voter, VoteKind::Up), Some(VoteKind::Up));
        assert_eq!(ledger.toggle(comment, voter, VoteKind::Up), None);
        assert_eq!(ledger.toggle(comment, voter, VoteKind::Down), Some(VoteKind::Down));
        assert_eq!(
            ledger.toggle(comment, voter, VoteKind::Up),
            Some(VoteKind::Up)
        );
        assert_eq!(ledger.tally(comment), VoteTally { up: 1, down: 0 });
    }

    #[test]
    fn test_tally_isolated_per_comment() {
        let mut ledger = VoteLedger::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let voter = Uuid::new_v4();

        ledger.toggle(a, voter, VoteKind::Up);
        ledger.toggle(b, voter, VoteKind::Down);

        assert_eq!(ledger.tally(a), VoteTally { up: 1, down: 0 });
        assert_eq!(ledger.tally(b), VoteTally { up: 0, down: 1 });
        assert_eq!(ledger.tally(Uuid::new_v4()), VoteTally::default());
    }
}
