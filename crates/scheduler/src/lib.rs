// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stv-scheduler: pluggable Worker-selection policies (C5).
//!
//! A policy is a capability with three operations — filter, score, pick
//! — modelled as a trait so the Manager can hold one behind a lock and
//! swap it without touching dispatch logic. `score` is async because
//! EPVM's CPU term needs two samples three seconds apart; that wait must
//! not hold the Manager's state locks, so the whole operation is a
//! suspension point by design.

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod epvm;
mod round_robin;

pub use epvm::{CpuUsageSource, Epvm};
pub use round_robin::RoundRobin;

use async_trait::async_trait;
use std::collections::HashMap;
use stv_core::{Node, Task};

/// Given a task and a list of candidate nodes, decide where it runs.
///
/// `score` takes `&mut self` because a policy may carry mutable state
/// (round-robin's cursor); EPVM simply ignores the mutability.
#[async_trait]
pub trait SchedulerPolicy: Send {
    fn name(&self) -> &str;

    /// Narrow `nodes` down to ones that could host `task` at all.
    fn filter(&self, task: &Task, nodes: &[Node]) -> Vec<Node>;

    /// Assign each candidate a cost; lower is better.
    async fn score(&mut self, task: &Task, candidates: &[Node]) -> HashMap<String, f64>;

    /// Pick the argmin of `scores` among `candidates`, ties broken by
    /// iteration (insertion) order.
    fn pick(&self, scores: &HashMap<String, f64>, candidates: &[Node]) -> Option<Node> {
        candidates
            .iter()
            .filter_map(|n| scores.get(&n.name).map(|&s| (n, s)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(n, _)| n.clone())
    }
}

/// Lets the Manager hold whichever policy `STV_SCHEDULER` names behind a
/// single boxed trait object, chosen once at startup.
#[async_trait]
impl SchedulerPolicy for Box<dyn SchedulerPolicy> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn filter(&self, task: &Task, nodes: &[Node]) -> Vec<Node> {
        (**self).filter(task, nodes)
    }

    async fn score(&mut self, task: &Task, candidates: &[Node]) -> HashMap<String, f64> {
        (**self).score(task, candidates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stv_core::NodeRole;

    fn node(name: &str) -> Node {
        Node {
            name: name.into(),
            addr: format!("{name}:9000"),
            cores_total: 4.0,
            cores_allocated: 0.0,
            memory_total_bytes: 1_000_000,
            memory_allocated_bytes: 0,
            disk_total_bytes: 1_000_000,
            disk_allocated_bytes: 0,
            stats: None,
            role: NodeRole::Worker,
            task_count: 0,
        }
    }

    #[test]
    fn pick_returns_none_for_empty_candidates() {
        let rr = RoundRobin::default();
        let scores = HashMap::new();
        assert!(rr.pick(&scores, &[]).is_none());
    }

    #[test]
    fn pick_ties_break_by_iteration_order() {
        let rr = RoundRobin::default();
        let candidates = vec![node("a"), node("b")];
        let mut scores = HashMap::new();
        scores.insert("a".to_string(), 1.0);
        scores.insert("b".to_string(), 1.0);
        let picked = rr.pick(&scores, &candidates).unwrap();
        assert_eq!(picked.name, "a");
    }
}
