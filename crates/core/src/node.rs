// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A Worker's metadata as the Manager sees it.

use crate::stats::NodeStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Worker,
    Manager,
}

/// Node metadata, rich enough for the scheduler's filter/score passes.
///
/// Resource fields are bytes, matching [`crate::task::Task`]'s resource
/// request fields — EPVM's cost formula is a ratio of the two and must
/// not mix units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// `host:port` the Manager dials for this Worker's HTTP API.
    pub addr: String,
    pub cores_total: f64,
    pub cores_allocated: f64,
    pub memory_total_bytes: u64,
    pub memory_allocated_bytes: u64,
    pub disk_total_bytes: u64,
    pub disk_allocated_bytes: u64,
    #[serde(default)]
    pub stats: Option<NodeStats>,
    pub role: NodeRole,
    #[serde(default)]
    pub task_count: usize,
}

impl Node {
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            cores_total: 0.0,
            cores_allocated: 0.0,
            memory_total_bytes: 0,
            memory_allocated_bytes: 0,
            disk_total_bytes: 0,
            disk_allocated_bytes: 0,
            stats: None,
            role: NodeRole::Worker,
            task_count: 0,
        }
    }

    pub fn disk_available_bytes(&self) -> u64 {
        self.disk_total_bytes.saturating_sub(self.disk_allocated_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_available_is_total_minus_allocated() {
        let mut n = Node::new("n1", "10.0.0.1:9000");
        n.disk_total_bytes = 1000;
        n.disk_allocated_bytes = 400;
        assert_eq!(n.disk_available_bytes(), 600);
    }

    #[test]
    fn disk_available_saturates_rather_than_underflows() {
        let mut n = Node::new("n1", "10.0.0.1:9000");
        n.disk_total_bytes = 100;
        n.disk_allocated_bytes = 400;
        assert_eq!(n.disk_available_bytes(), 0);
    }
}
