//! vote.rs
//!
//! The ephemeral vote message exchanged between nodes. Wire shape is the
//! JSON body `{ "senderId": n, "value": 0|1|"?", "round": k }`.

use serde::{Deserialize, Serialize};

use crate::{NodeId, Value};

/// One vote from `sender` for round `round`.
///
/// Votes are keyed by `(round, sender)`; a later vote from the same sender
/// in the same round overwrites the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "senderId")]
    pub sender: NodeId,
    pub value: Value,
    pub round: u64,
}

impl Vote {
    pub fn new(sender: NodeId, value: Value, round: u64) -> Self {
        Self { sender, value, round }
    }
}
