//! engine.rs
//!
//! The round engine. Drives one node through successive rounds of
//! broadcast / collect / tally until it decides, and owns the node's
//! state and mailbox in between.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, warn};

use benor_common::config::{COLLECT_WINDOW, MAX_ROUNDS};
use benor_common::{BenorError, NodeId, Value, Vote};

use crate::mailbox::VoteMailbox;
use crate::sender::VoteSender;
use crate::state::{NodeState, Phase, StateSnapshot};
use crate::tally::{QuorumPolicy, RoundTally, Verdict};

/// One participant of the consensus group.
///
/// Inbound votes land in the mailbox through [`handle_vote`]; the round
/// engine spawned by [`start`] reads them back out on its own pace. The
/// two sides never alias a round's votes: tallying works on a snapshot.
///
/// [`handle_vote`]: ConsensusNode::handle_vote
/// [`start`]: ConsensusNode::start
pub struct ConsensusNode {
    pub id: NodeId,
    policy: QuorumPolicy,
    state: RwLock<NodeState>,
    mailbox: RwLock<VoteMailbox>,
    transport: Arc<dyn VoteSender>,
    ready: watch::Receiver<bool>,
    running: AtomicBool,
    coin: Mutex<StdRng>,
}

impl ConsensusNode {
    pub fn new(
        id: NodeId,
        initial_value: Value,
        faulty: bool,
        policy: QuorumPolicy,
        transport: Arc<dyn VoteSender>,
        ready: watch::Receiver<bool>,
        seed: Option<u64>,
    ) -> Self {
        let coin = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            id,
            policy,
            state: RwLock::new(NodeState::new(id, initial_value, faulty)),
            mailbox: RwLock::new(VoteMailbox::new()),
            transport,
            ready,
            running: AtomicBool::new(false),
            coin: Mutex::new(coin),
        }
    }

    /// Inbound side: validates and records one peer vote.
    ///
    /// The killed/faulty check runs fresh on every call; a stopped node
    /// rejects rather than silently ignores.
    pub async fn handle_vote(&self, vote: Vote) -> Result<(), BenorError> {
        {
            let state = self.state.read().await;
            if state.is_killed() {
                return Err(BenorError::NodeStopped);
            }
            if state.is_faulty() {
                return Err(BenorError::NodeFaulty);
            }
        }

        self.mailbox.write().await.record(vote);
        info!(
            "📩 Node {} recorded vote from node {}: {} for round {}",
            self.id, vote.sender, vote.value, vote.round
        );
        Ok(())
    }

    /// Live for honest non-killed nodes; faulty nodes always report
    /// unhealthy, whatever their internal state.
    pub async fn health(&self) -> Result<(), BenorError> {
        let state = self.state.read().await;
        if state.is_faulty() {
            return Err(BenorError::NodeFaulty);
        }
        if state.is_killed() {
            return Err(BenorError::NodeStopped);
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        self.state.read().await.snapshot()
    }

    /// How many votes the mailbox holds for one round. Observability only.
    pub async fn mailbox_round_len(&self, round: u64) -> usize {
        self.mailbox.read().await.round_len(round)
    }

    /// Stops the node. All further protocol traffic is rejected.
    pub async fn kill(&self) {
        self.state.write().await.kill();
        info!("🛑 Node {} stopped", self.id);
    }

    /// Kicks off the round engine in a background task.
    ///
    /// Idempotent: a node that is already running, or already decided,
    /// returns `Ok` without touching its state. Killed and faulty nodes
    /// refuse to start.
    pub async fn start(self: Arc<Self>) -> Result<(), BenorError> {
        {
            let state = self.state.read().await;
            if state.is_killed() {
                return Err(BenorError::NodeStopped);
            }
            if state.is_faulty() {
                return Err(BenorError::NodeFaulty);
            }
        }

        if self.running.swap(true, Ordering::SeqCst) {
            info!("Node {} already started, ignoring duplicate start", self.id);
            return Ok(());
        }

        self.state.write().await.begin();

        let node = Arc::clone(&self);
        tokio::spawn(async move {
            match node.run_rounds().await {
                Ok(value) => info!("✅ Node {} has reached consensus: {}", node.id, value),
                Err(e) => warn!("🛑 Node {} consensus halted: {}", node.id, e),
            }
        });
        Ok(())
    }

    async fn run_rounds(&self) -> Result<Value, BenorError> {
        self.await_cluster_ready().await?;
        info!("🚀 Node {} is starting the consensus process", self.id);

        loop {
            // killed may be set asynchronously between rounds
            let (round, estimate) = {
                let state = self.state.read().await;
                if state.is_killed() {
                    return Err(BenorError::NodeStopped);
                }
                if state.phase() == Phase::Decided {
                    return Ok(state.estimate());
                }
                (state.round(), state.estimate())
            };
            info!("🔄 Node {} - round {}, value {}", self.id, round, estimate);

            // An undecided estimate is never broadcast. The node's own vote
            // counts too, so it goes straight into the local mailbox.
            if estimate.is_settled() {
                let vote = Vote::new(self.id, estimate, round);
                self.mailbox.write().await.record(vote);
                self.broadcast(vote);
            }

            tokio::time::sleep(COLLECT_WINDOW).await;

            let tally = {
                let mailbox = self.mailbox.read().await;
                RoundTally::from_votes(mailbox.round_snapshot(round).values())
            };
            info!(
                "📊 Node {} round {} tally: {} zeros, {} ones",
                self.id, round, tally.zeros, tally.ones
            );

            let mut state = self.state.write().await;
            if state.is_killed() {
                return Err(BenorError::NodeStopped);
            }
            match self.policy.evaluate(&tally) {
                Verdict::Decide(value) => {
                    state.decide(value);
                    return Ok(value);
                }
                Verdict::Adopt(value) => state.adopt(value),
                Verdict::Pending => {}
            }

            if round + 1 >= MAX_ROUNDS {
                // Liveness fallback: never leave the loop undecided.
                let value = if state.estimate().is_settled() {
                    state.estimate()
                } else {
                    self.flip_coin().await
                };
                state.decide(value);
                info!("🎲 Node {} hit the round cap, deciding {}", self.id, value);
                return Ok(value);
            }
            state.advance_round();
        }
    }

    /// Fan-out of independent, individually retried sends. Nobody waits
    /// for stragglers: the round only waits for its collection window.
    fn broadcast(&self, vote: Vote) {
        for peer in (0..self.policy.n).map(NodeId) {
            if peer == self.id {
                continue;
            }
            let transport = Arc::clone(&self.transport);
            let node_id = self.id;
            tokio::spawn(async move {
                if let Err(e) = transport.send_vote(peer, vote).await {
                    warn!("❌ Node {} gave up on node {}: {}", node_id, peer, e);
                }
            });
        }
    }

    async fn await_cluster_ready(&self) -> Result<(), BenorError> {
        let mut ready = self.ready.clone();
        ready
            .wait_for(|all_up| *all_up)
            .await
            .map_err(|_| BenorError::Transport("readiness gate dropped".to_string()))?;
        Ok(())
    }

    async fn flip_coin(&self) -> Value {
        if self.coin.lock().await.gen_bool(0.5) {
            Value::One
        } else {
            Value::Zero
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Default)]
    struct MockSender {
        sent: Mutex<Vec<(NodeId, Vote)>>,
    }

    #[async_trait]
    impl VoteSender for MockSender {
        async fn send_vote(&self, target: NodeId, vote: Vote) -> Result<(), String> {
            self.sent.lock().await.push((target, vote));
            Ok(())
        }
    }

    struct TestNode {
        node: Arc<ConsensusNode>,
        sender: Arc<MockSender>,
        _ready_tx: watch::Sender<bool>,
    }

    fn test_node(
        id: usize,
        n: usize,
        f: usize,
        initial: Value,
        faulty: bool,
        seed: Option<u64>,
    ) -> TestNode {
        let (ready_tx, ready_rx) = watch::channel(true);
        let sender = Arc::new(MockSender::default());
        let node = Arc::new(ConsensusNode::new(
            NodeId(id),
            initial,
            faulty,
            QuorumPolicy::new(n, f),
            sender.clone() as Arc<dyn VoteSender>,
            ready_rx,
            seed,
        ));
        TestNode {
            node,
            sender,
            _ready_tx: ready_tx,
        }
    }

    async fn wait_for_decision(node: &ConsensusNode) -> StateSnapshot {
        for _ in 0..200 {
            let snap = node.snapshot().await;
            if snap.decided == Some(true) {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("node {} never decided", node.id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_node_decides_its_own_value() {
        let harness = test_node(0, 1, 0, Value::One, false, None);
        harness.node.clone().start().await.unwrap();

        let snap = wait_for_decision(&harness.node).await;
        assert_eq!(snap.x, Value::One);
        assert_eq!(snap.k, Some(0));
        // no peers, no traffic
        assert!(harness.sender.sent.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_majority_of_peer_votes_decides() {
        let harness = test_node(0, 3, 0, Value::Zero, false, None);
        harness.node.clone().start().await.unwrap();

        harness
            .node
            .handle_vote(Vote::new(NodeId(1), Value::Zero, 0))
            .await
            .unwrap();
        harness
            .node
            .handle_vote(Vote::new(NodeId(2), Value::One, 0))
            .await
            .unwrap();

        let snap = wait_for_decision(&harness.node).await;
        assert_eq!(snap.x, Value::Zero);

        // broadcast went to both peers, not to self
        let sent = harness.sender.sent.lock().await;
        let round0_targets: Vec<NodeId> = sent
            .iter()
            .filter(|(_, v)| v.round == 0)
            .map(|(t, _)| *t)
            .collect();
        assert!(round0_targets.contains(&NodeId(1)));
        assert!(round0_targets.contains(&NodeId(2)));
        assert!(!round0_targets.contains(&NodeId(0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_cap_forces_random_decision() {
        // An honest node configured "?" never broadcasts and never sees a
        // majority, so only the coin can settle it.
        let harness = test_node(0, 3, 0, Value::Undecided, false, Some(7));
        harness.node.clone().start().await.unwrap();

        let snap = wait_for_decision(&harness.node).await;
        assert!(snap.x.is_settled());
        assert_eq!(snap.k, Some(MAX_ROUNDS - 1));
        assert!(harness.sender.sent.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_coin_is_deterministic() {
        let first = test_node(0, 3, 0, Value::Undecided, false, Some(42));
        first.node.clone().start().await.unwrap();
        let a = wait_for_decision(&first.node).await;

        let second = test_node(0, 3, 0, Value::Undecided, false, Some(42));
        second.node.clone().start().await.unwrap();
        let b = wait_for_decision(&second.node).await;

        assert_eq!(a.x, b.x);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_node_decides_its_standing_estimate_at_cap() {
        // One vote out of three never reaches the adopt threshold, but the
        // cap still terminates on the settled estimate, not on a coin.
        let harness = test_node(0, 3, 0, Value::One, false, None);
        harness.node.clone().start().await.unwrap();

        let snap = wait_for_decision(&harness.node).await;
        assert_eq!(snap.x, Value::One);
        assert_eq!(snap.k, Some(MAX_ROUNDS - 1));
    }

    #[tokio::test]
    async fn test_faulty_node_refuses_everything() {
        let harness = test_node(1, 3, 1, Value::Zero, true, None);

        assert!(matches!(
            harness.node.clone().start().await,
            Err(BenorError::NodeFaulty)
        ));
        assert!(matches!(
            harness
                .node
                .handle_vote(Vote::new(NodeId(0), Value::Zero, 0))
                .await,
            Err(BenorError::NodeFaulty)
        ));
        assert!(harness.node.health().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_mid_run_stops_the_engine() {
        let harness = test_node(0, 3, 0, Value::Zero, false, None);
        harness.node.clone().start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        harness.node.kill().await;

        // give the engine time to observe the flag
        tokio::time::sleep(Duration::from_secs(2)).await;
        let snap = harness.node.snapshot().await;
        assert!(snap.killed);
        assert_eq!(snap.decided, Some(false));

        assert!(matches!(
            harness
                .node
                .handle_vote(Vote::new(NodeId(1), Value::Zero, 0))
                .await,
            Err(BenorError::NodeStopped)
        ));
        assert!(matches!(
            harness.node.clone().start().await,
            Err(BenorError::NodeStopped)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decision_is_immutable_afterwards() {
        let harness = test_node(0, 1, 0, Value::Zero, false, None);
        harness.node.clone().start().await.unwrap();
        let snap = wait_for_decision(&harness.node).await;
        assert_eq!(snap.x, Value::Zero);

        // late votes and duplicate starts change nothing
        harness
            .node
            .handle_vote(Vote::new(NodeId(1), Value::One, 5))
            .await
            .unwrap();
        harness.node.clone().start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let after = harness.node.snapshot().await;
        assert_eq!(after.x, Value::Zero);
        assert_eq!(after.k, snap.k);
        assert_eq!(after.decided, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_start_is_idempotent() {
        let harness = test_node(0, 3, 0, Value::Zero, false, None);
        harness.node.clone().start().await.unwrap();
        harness.node.clone().start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(700)).await;
        // a second engine would have double-voted round 0
        let sent = harness.sender.sent.lock().await;
        let round0_to_peer1 = sent
            .iter()
            .filter(|(t, v)| *t == NodeId(1) && v.round == 0)
            .count();
        assert_eq!(round0_to_peer1, 1);
    }
}
