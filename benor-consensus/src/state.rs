//! state.rs
//!
//! One node's consensus-relevant state: current estimate, round counter,
//! decision phase and the faulty/killed flags.

use benor_common::{NodeId, Value};
use serde::{Deserialize, Serialize};

/// Where the node is in its consensus lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    /// Terminal. Estimate and round are frozen.
    Decided,
}

#[derive(Debug)]
pub struct NodeState {
    pub id: NodeId,
    faulty: bool,
    killed: bool,
    estimate: Value,
    phase: Phase,
    round: u64,
}

/// Read-only view exposed on `GET /state`. Faulty nodes report no decision
/// state and no round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub killed: bool,
    pub x: Value,
    pub decided: Option<bool>,
    pub k: Option<u64>,
}

impl NodeState {
    /// Honest nodes start with their initial value; faulty nodes carry no
    /// meaningful estimate.
    pub fn new(id: NodeId, initial_value: Value, faulty: bool) -> Self {
        Self {
            id,
            faulty,
            killed: false,
            estimate: if faulty { Value::Undecided } else { initial_value },
            phase: Phase::NotStarted,
            round: 0,
        }
    }

    pub fn is_faulty(&self) -> bool {
        self.faulty
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    /// Sticky: there is no way back once a node is stopped.
    pub fn kill(&mut self) {
        self.killed = true;
    }

    pub fn estimate(&self) -> Value {
        self.estimate
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// `NotStarted -> InProgress`: round counter back to zero.
    pub fn begin(&mut self) {
        if self.phase == Phase::NotStarted {
            self.phase = Phase::InProgress;
            self.round = 0;
        }
    }

    /// Non-terminal adoption of a majority value.
    pub fn adopt(&mut self, value: Value) {
        if self.phase != Phase::Decided {
            self.estimate = value;
        }
    }

    /// Terminal transition. Ignored if already decided.
    pub fn decide(&mut self, value: Value) {
        if self.phase != Phase::Decided {
            self.estimate = value;
            self.phase = Phase::Decided;
        }
    }

    pub fn advance_round(&mut self) {
        if self.phase != Phase::Decided {
            self.round += 1;
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            killed: self.killed,
            x: self.estimate,
            decided: if self.faulty {
                None
            } else {
                Some(self.phase == Phase::Decided)
            },
            k: if self.faulty { None } else { Some(self.round) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_honest_node_starts_with_initial_value() {
        let state = NodeState::new(NodeId(0), Value::One, false);
        assert_eq!(state.estimate(), Value::One);
        assert_eq!(state.phase(), Phase::NotStarted);
        let snap = state.snapshot();
        assert_eq!(snap.decided, Some(false));
        assert_eq!(snap.k, Some(0));
    }

    #[test]
    fn test_faulty_node_has_no_estimate_or_round() {
        let state = NodeState::new(NodeId(1), Value::One, true);
        assert_eq!(state.estimate(), Value::Undecided);
        let snap = state.snapshot();
        assert_eq!(snap.x, Value::Undecided);
        assert_eq!(snap.decided, None);
        assert_eq!(snap.k, None);
    }

    #[test]
    fn test_decision_is_final() {
        let mut state = NodeState::new(NodeId(0), Value::Zero, false);
        state.begin();
        state.decide(Value::Zero);

        state.adopt(Value::One);
        state.decide(Value::One);
        state.advance_round();

        assert_eq!(state.estimate(), Value::Zero);
        assert_eq!(state.round(), 0);
        assert_eq!(state.phase(), Phase::Decided);
    }

    #[test]
    fn test_kill_is_sticky() {
        let mut state = NodeState::new(NodeId(0), Value::Zero, false);
        state.kill();
        assert!(state.is_killed());
        assert!(state.snapshot().killed);
    }

    #[test]
    fn test_begin_only_from_not_started() {
        let mut state = NodeState::new(NodeId(0), Value::Zero, false);
        state.begin();
        state.advance_round();
        state.advance_round();
        state.begin(); // no-op while in progress
        assert_eq!(state.round(), 2);
    }
}
