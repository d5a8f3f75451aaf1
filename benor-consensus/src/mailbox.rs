//! mailbox.rs
//!
//! Stores the votes a node has received, keyed by `(round, sender)`.

use std::collections::HashMap;

use benor_common::{NodeId, Value, Vote};

/// Received votes per round. A later vote from the same sender in the same
/// round overwrites the earlier one; duplicates are not an error.
///
/// Rounds are never cleared: a vote for round `k` that arrives before the
/// local engine enters round `k` must still be there when `k` is tallied.
#[derive(Debug, Default)]
pub struct VoteMailbox {
    // round -> sender -> value
    votes: HashMap<u64, HashMap<NodeId, Value>>,
}

impl VoteMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-write-wins per `(round, sender)` pair.
    pub fn record(&mut self, vote: Vote) {
        self.votes
            .entry(vote.round)
            .or_default()
            .insert(vote.sender, vote.value);
    }

    /// A copy of round `k`'s votes. The tally works on this snapshot so
    /// that votes arriving afterwards cannot corrupt an already computed
    /// count.
    pub fn round_snapshot(&self, round: u64) -> HashMap<NodeId, Value> {
        self.votes.get(&round).cloned().unwrap_or_default()
    }

    pub fn round_len(&self, round: u64) -> usize {
        self.votes.get(&round).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.votes.values().all(|m| m.is_empty())
    }
}
