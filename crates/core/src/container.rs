// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container configuration passed to the container engine adapter.

use crate::task::{PortBinding, RestartPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the engine adapter needs to run a task's container.
/// Derived from a [`crate::task::Task`] at the point the Worker calls
/// `run` — kept separate from `Task` so the engine boundary doesn't leak
/// FSM/bookkeeping fields it has no use for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub name: String,
    pub image: String,
    pub cpu: f64,
    pub memory_bytes: u64,
    pub exposed_ports: Vec<PortBinding>,
    pub restart_policy: RestartPolicy,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ContainerConfig {
    pub fn from_task(task: &crate::task::Task) -> Self {
        Self {
            name: task.name.clone(),
            image: task.image.clone(),
            cpu: task.cpu,
            memory_bytes: task.memory_bytes,
            exposed_ports: task.exposed_ports.clone(),
            restart_policy: task.restart_policy,
            env: HashMap::new(),
        }
    }
}
