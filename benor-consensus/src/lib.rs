//! lib.rs
//!
//! The consensus core: one node's state machine, its mailbox of received
//! votes, the quorum arithmetic and the round engine that drives a node
//! from its initial estimate to a decision.
//!
//! The core talks to the outside world through two seams only: the
//! [`VoteSender`] port for outbound votes, and [`ConsensusNode::handle_vote`]
//! for inbound ones. Everything else (HTTP, orchestration) lives in
//! `benor-node`.

pub mod engine;
pub mod mailbox;
pub mod sender;
pub mod state;
pub mod tally;

pub use engine::ConsensusNode;
pub use mailbox::VoteMailbox;
pub use sender::VoteSender;
pub use state::{NodeState, Phase, StateSnapshot};
pub use tally::{QuorumPolicy, RoundTally, Verdict};
