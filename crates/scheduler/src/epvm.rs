// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! EPVM: Economical Placement of Virtual Machines, a resource-cost
//! placement heuristic from the MOSIX literature.

use crate::SchedulerPolicy;
use async_trait::async_trait;
use std::collections::HashMap;
use stv_core::{Node, Task};

/// Base of the EPVM cost exponential.
pub const LIEB: f64 = 1.539_600_717_839_002_038_69;

/// Denominator of the task-count fraction; never zero.
pub const MAX_JOBS: f64 = 4.0;

/// Supplies the fractional CPU usage (0.0..=1.0) of a node, sampled
/// twice three seconds apart. Implemented by the Manager via two
/// `GET /stats` polls; a fixed/fake source drives deterministic tests.
#[async_trait]
pub trait CpuUsageSource: Send + Sync {
    async fn usage(&self, node: &Node) -> f64;
}

/// Stateless EPVM policy. Carries no mutable cursor — every call is a
/// fresh computation from the node's current resource counters.
pub struct Epvm<S: CpuUsageSource> {
    cpu_source: S,
}

impl<S: CpuUsageSource> Epvm<S> {
    pub fn new(cpu_source: S) -> Self {
        Self { cpu_source }
    }
}

#[async_trait]
impl<S: CpuUsageSource> SchedulerPolicy for Epvm<S> {
    fn name(&self) -> &str {
        "epvm"
    }

    /// Only nodes with enough free disk for `task` are candidates.
    fn filter(&self, task: &Task, nodes: &[Node]) -> Vec<Node> {
        nodes.iter().filter(|n| n.disk_available_bytes() >= task.disk_bytes).cloned().collect()
    }

    async fn score(&mut self, task: &Task, candidates: &[Node]) -> HashMap<String, f64> {
        let mut scores = HashMap::with_capacity(candidates.len());
        for node in candidates {
            scores.insert(node.name.clone(), node_cost(&self.cpu_source, task, node).await);
        }
        scores
    }
}

async fn node_cost<S: CpuUsageSource>(cpu_source: &S, task: &Task, node: &Node) -> f64 {
    let cpu_usage = cpu_source.usage(node).await;
    let cpu_load = cpu_usage / 2f64.powf(0.8);

    let mem_used_bytes = node.stats.as_ref().map(|s| s.memory.used_kb * 1024).unwrap_or(0);
    let mem_alloc = mem_used_bytes as f64 + node.memory_allocated_bytes as f64;
    let mem_total = (node.memory_total_bytes as f64).max(1.0);
    let task_mem = task.memory_bytes as f64;

    let mem_frac_old = mem_alloc / mem_total;
    let mem_frac_new = (mem_alloc + task_mem) / mem_total;

    let task_frac_old = node.task_count as f64 / MAX_JOBS;
    let task_frac_new = (node.task_count as f64 + 1.0) / MAX_JOBS;

    let mem_cost = (LIEB.powf(mem_frac_new) - LIEB.powf(mem_frac_old))
        + (LIEB.powf(task_frac_new) - LIEB.powf(task_frac_old));

    // Preserved verbatim from the source: this term is `LIEB^cpuLoad -
    // LIEB^cpuLoad`, identically zero. One of the two `cpuLoad` terms
    // may have been meant to be the *new* load after placement — see
    // DESIGN.md. Not silently fixed here.
    let cpu_cancel = LIEB.powf(cpu_load) - LIEB.powf(cpu_load);
    let cpu_cost = cpu_cancel + (LIEB.powf(task_frac_new) - LIEB.powf(task_frac_old));

    mem_cost + cpu_cost
}
