// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker roster: endpoints, their last-known `Node` metadata, and the
//! bidirectional task/worker mapping the dispatcher and reconciliation
//! loop both consult.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use stv_core::{Node, TaskId};

#[derive(Default)]
struct State {
    nodes: HashMap<String, Node>,
    worker_tasks: HashMap<String, HashSet<TaskId>>,
    task_worker: HashMap<TaskId, String>,
}

/// `Workers` + `WorkerNodes` + `WorkerTaskMap` + `TaskWorkerMap`, behind
/// one lock — all four are read and written together on every dispatch
/// and reconciliation pass.
#[derive(Default)]
pub struct Roster {
    state: Mutex<State>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a worker's endpoint and metadata.
    pub fn register(&self, endpoint: impl Into<String>, node: Node) {
        let mut s = self.state.lock();
        let endpoint = endpoint.into();
        s.worker_tasks.entry(endpoint.clone()).or_default();
        s.nodes.insert(endpoint, node);
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.state.lock().nodes.keys().cloned().collect()
    }

    /// Snapshot of every registered node, for the scheduler's filter/score pass.
    pub fn nodes(&self) -> Vec<Node> {
        self.state.lock().nodes.values().cloned().collect()
    }

    pub fn worker_for_task(&self, task_id: TaskId) -> Option<String> {
        self.state.lock().task_worker.get(&task_id).cloned()
    }

    /// Record that `task_id` has been placed on `endpoint`: updates both
    /// maps and bumps the node's `task_count`.
    pub fn assign(&self, task_id: TaskId, endpoint: &str) {
        let mut s = self.state.lock();
        s.worker_tasks.entry(endpoint.to_string()).or_default().insert(task_id);
        s.task_worker.insert(task_id, endpoint.to_string());
        if let Some(node) = s.nodes.get_mut(endpoint) {
            node.task_count += 1;
        }
    }

    /// Sum of `|WorkerTaskMap[w]|` across every worker; must equal
    /// `|TaskWorkerMap|`.
    pub fn assigned_task_count(&self) -> usize {
        self.state.lock().worker_tasks.values().map(|s| s.len()).sum()
    }

    pub fn task_worker_count(&self) -> usize {
        self.state.lock().task_worker.len()
    }
}
