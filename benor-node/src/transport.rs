//! transport.rs
//!
//! HTTP vote delivery: probe the target's health endpoint, then post the
//! vote to its inbox, with a bounded retry budget. Failures end here —
//! the round engine never sees them as errors.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use benor_common::config::{MAX_RETRIES, RETRY_DELAY};
use benor_common::{NodeId, Vote};
use benor_consensus::VoteSender;

pub struct HttpVoteSender {
    client: Client,
    self_id: NodeId,
    base_port: u16,
}

impl HttpVoteSender {
    pub fn new(self_id: NodeId, base_port: u16) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            self_id,
            base_port,
        }
    }

    fn url_of(&self, target: NodeId, route: &str) -> String {
        format!(
            "http://127.0.0.1:{}/{}",
            self.base_port + target.0 as u16,
            route
        )
    }

    async fn try_send(&self, target: NodeId, vote: &Vote) -> Result<(), String> {
        // Liveness probe before paying for the real send.
        let probe = self
            .client
            .get(self.url_of(target, "status"))
            .send()
            .await
            .map_err(|e| format!("probe failed: {e}"))?;
        if !probe.status().is_success() {
            return Err(format!("node {} is not responding: {}", target, probe.status()));
        }

        self.client
            .post(self.url_of(target, "message"))
            .json(vote)
            .send()
            .await
            .map_err(|e| format!("send failed: {e}"))?;
        Ok(())
    }
}

#[async_trait]
impl VoteSender for HttpVoteSender {
    async fn send_vote(&self, target: NodeId, vote: Vote) -> Result<(), String> {
        for attempt in 1..=MAX_RETRIES {
            debug!(
                "🚀 Node {} sending vote to node {} (value {}, round {}) - attempt {}",
                self.self_id, target, vote.value, vote.round, attempt
            );
            match self.try_send(target, &vote).await {
                Ok(()) => {
                    info!(
                        "✅ Node {} delivered vote to node {} for round {}",
                        self.self_id, target, vote.round
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "⚠️ Node {} failed to send vote to node {}: {} (attempt {}/{})",
                        self.self_id, target, e, attempt, MAX_RETRIES
                    );
                    if attempt < MAX_RETRIES {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        Err(format!("gave up after {MAX_RETRIES} attempts"))
    }
}
