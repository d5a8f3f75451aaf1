//! sender.rs
//!
//! Outbound port of the consensus core. The node crate implements this
//! over HTTP; tests implement it with an in-memory mock.

use async_trait::async_trait;
use benor_common::{NodeId, Vote};

/// Best-effort delivery of one vote to one peer's inbox.
///
/// Implementations own their retry policy. An `Err` means the peer was
/// given up on; the round engine logs it and moves on — a missing peer
/// must never fail the caller's round.
#[async_trait]
pub trait VoteSender: Send + Sync {
    async fn send_vote(&self, target: NodeId, vote: Vote) -> Result<(), String>;
}
