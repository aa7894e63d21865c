// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Round-robin scheduler: cycles through candidates in order, favouring
//! whichever node the cursor currently points at.

use crate::SchedulerPolicy;
use async_trait::async_trait;
use std::collections::HashMap;
use stv_core::{Node, Task};

/// Cursor-based round robin. The cursor is mutable state scoped to this
/// instance — the Manager owns exactly one and guards it with the same
/// lock it uses for its other shared structures.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }
}

#[async_trait]
impl SchedulerPolicy for RoundRobin {
    fn name(&self) -> &str {
        "round_robin"
    }

    fn filter(&self, _task: &Task, nodes: &[Node]) -> Vec<Node> {
        nodes.to_vec()
    }

    async fn score(&mut self, _task: &Task, candidates: &[Node]) -> HashMap<String, f64> {
        let mut scores = HashMap::with_capacity(candidates.len());
        if candidates.is_empty() {
            return scores;
        }
        let winner = self.cursor % candidates.len();
        self.cursor = (self.cursor + 1) % candidates.len().max(1);
        for (i, node) in candidates.iter().enumerate() {
            scores.insert(node.name.clone(), if i == winner { 0.1 } else { 1.0 });
        }
        scores
    }
}
