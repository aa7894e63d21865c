// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canned `NodeStatsProvider` for Worker and scheduler tests.

use super::{NodeStatsProvider, StatsError};
use async_trait::async_trait;
use parking_lot::Mutex;
use stv_core::NodeStats;

pub struct FakeStatsProvider {
    snapshots: Mutex<Vec<NodeStats>>,
}

impl FakeStatsProvider {
    /// Returns each snapshot in `snapshots` in turn, repeating the last
    /// one once exhausted — enough to drive a fixed two-sample EPVM read.
    pub fn new(snapshots: Vec<NodeStats>) -> Self {
        Self { snapshots: Mutex::new(snapshots) }
    }
}

#[async_trait]
impl NodeStatsProvider for FakeStatsProvider {
    async fn snapshot(&self) -> Result<NodeStats, StatsError> {
        let mut snapshots = self.snapshots.lock();
        if snapshots.len() > 1 {
            Ok(snapshots.remove(0))
        } else {
            Ok(snapshots.first().cloned().unwrap_or_default())
        }
    }
}
