use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};

use benor_common::config::{COLLECT_WINDOW, MAX_ROUNDS};
use benor_node::cli::Cli;
use benor_node::launcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config()?;

    let cluster = launcher::launch(&config).await?;

    // Trigger every round engine through its own control endpoint, the way
    // an external operator would. Faulty nodes refuse with a 400.
    let client = reqwest::Client::new();
    for handle in &cluster.nodes {
        let url = format!("http://127.0.0.1:{}/start", handle.port);
        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => {
                info!("▶️ Node {} started", handle.id);
            }
            Ok(res) => warn!("Node {} refused to start: {}", handle.id, res.status()),
            Err(e) => warn!("could not reach node {}: {}", handle.id, e),
        }
    }

    // Worst case is the full round cap plus transport retries; anything
    // beyond that means a wedged cluster.
    let deadline = Instant::now() + COLLECT_WINDOW * (3 * MAX_ROUNDS as u32) + Duration::from_secs(10);
    loop {
        tokio::time::sleep(COLLECT_WINDOW).await;

        let mut all_decided = true;
        for (index, handle) in cluster.nodes.iter().enumerate() {
            if config.faulty[index] {
                continue;
            }
            if handle.node.snapshot().await.decided != Some(true) {
                all_decided = false;
            }
        }
        if all_decided {
            break;
        }
        if Instant::now() > deadline {
            warn!("⏰ Giving up waiting for consensus");
            break;
        }
    }

    for handle in &cluster.nodes {
        let snap = handle.node.snapshot().await;
        info!(
            "🏁 Node {} final state: x={}, decided={:?}, k={:?}, killed={}",
            handle.id, snap.x, snap.decided, snap.k, snap.killed
        );
    }

    Ok(())
}
