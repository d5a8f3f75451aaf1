//! launcher.rs
//!
//! Assembles and launches one simulated cluster: N consensus nodes, each
//! with its own listener and API server, sharing nothing but the network.
//! The launcher owns the readiness gate every round engine awaits before
//! entering round 0.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use benor_common::{BenorError, NodeId, SimConfig};
use benor_consensus::{ConsensusNode, QuorumPolicy, VoteSender};

use crate::api::rest;
use crate::transport::HttpVoteSender;

/// One launched node: its consensus core and the task serving its API.
pub struct NodeHandle {
    pub id: NodeId,
    pub port: u16,
    pub node: Arc<ConsensusNode>,
    pub server: JoinHandle<()>,
}

/// The whole cluster. Dropping it aborts every node's server task.
pub struct ClusterHandle {
    pub nodes: Vec<NodeHandle>,
    ready_tx: watch::Sender<bool>,
}

impl ClusterHandle {
    /// True once every node's listener is up — the readiness gate the
    /// round engines block on.
    pub fn all_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    pub fn shutdown(&self) {
        for handle in &self.nodes {
            handle.server.abort();
        }
    }
}

impl Drop for ClusterHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Validates the configuration, binds every node's listener, then opens
/// the readiness gate. Configuration errors are fatal before any node is
/// created.
pub async fn launch(config: &SimConfig) -> Result<ClusterHandle, BenorError> {
    config.validate()?;

    info!(
        "🚀 Launching nodes... 🌍 Total Nodes: {}, Faulty Nodes: {}",
        config.n, config.f
    );

    let (ready_tx, ready_rx) = watch::channel(false);
    let policy = QuorumPolicy::new(config.n, config.f);
    let mut nodes = Vec::with_capacity(config.n);

    for index in 0..config.n {
        let id = NodeId(index);
        let port = config.port_of(id);
        info!(
            "📌 Launching node {} | initial value: {} | faulty: {}",
            id, config.initial_values[index], config.faulty[index]
        );

        let transport: Arc<dyn VoteSender> =
            Arc::new(HttpVoteSender::new(id, config.base_port));
        // Distinct stream per node so seeded clusters don't flip in lockstep.
        let seed = config.seed.map(|seed| seed.wrapping_add(index as u64));

        let node = Arc::new(ConsensusNode::new(
            id,
            config.initial_values[index],
            config.faulty[index],
            policy,
            transport,
            ready_rx.clone(),
            seed,
        ));

        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        info!("🎧 Node {} is listening on port {}", id, port);

        let server_node = Arc::clone(&node);
        let server = tokio::spawn(async move {
            if let Err(e) = rest::serve(Arc::clone(&server_node), listener).await {
                error!("api server of node {} failed: {}", server_node.id, e);
            }
        });

        nodes.push(NodeHandle {
            id,
            port,
            node,
            server,
        });
    }

    // Every listener is bound; open the gate.
    ready_tx.send(true).ok();
    info!("✅ All nodes are up and running!");

    Ok(ClusterHandle { nodes, ready_tx })
}
