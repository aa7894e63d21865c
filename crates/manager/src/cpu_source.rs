// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Manager's concrete [`CpuUsageSource`]: two `GET /stats` polls
//! three seconds apart against the node's own HTTP endpoint.

use async_trait::async_trait;
use std::time::Duration;
use stv_core::{CpuTime, Node, NodeStats};
use stv_scheduler::CpuUsageSource;
use stv_transport::StandardResponse;

const SAMPLE_GAP: Duration = Duration::from_secs(3);

pub struct HttpCpuUsageSource;

impl HttpCpuUsageSource {
    pub fn new() -> Self {
        Self
    }

    async fn sample(&self, node: &Node) -> Option<CpuTime> {
        let resp = stv_transport::get(&node.addr, "/stats").await.ok()?;
        if resp.status != 200 {
            return None;
        }
        let envelope: StandardResponse<NodeStats> = serde_json::from_str(&resp.body).ok()?;
        envelope.response.map(|s| s.cpu)
    }
}

impl Default for HttpCpuUsageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CpuUsageSource for HttpCpuUsageSource {
    /// Returns `0.0` on any sampling failure — a dead or unreachable
    /// node should not stop placement from scoring it, just from
    /// favouring it.
    async fn usage(&self, node: &Node) -> f64 {
        let Some(first) = self.sample(node).await else { return 0.0 };
        tokio::time::sleep(SAMPLE_GAP).await;
        let Some(second) = self.sample(node).await else { return 0.0 };
        CpuTime::usage_between(&first, &second)
    }
}
