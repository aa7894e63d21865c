// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and TaskEvent: the data the whole system coordinates around.

use crate::fsm::{TaskEventKind, TaskState};
use crate::id::{EventId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of automatic restarts before the health loop gives up
/// on a task: `restart_count` never exceeds this.
pub const MAX_RESTARTS: u32 = 3;

/// What the container engine should do when a container exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    No,
    Always,
    UnlessStopped,
    OnFailure,
}

/// A container port exposed by a task, with its protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub port: u16,
    pub protocol: String,
}

/// A containerised workload the system has been asked to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub state: TaskState,
    pub event: TaskEventKind,
    pub image: String,
    pub cpu: f64,
    pub memory_bytes: u64,
    pub disk_bytes: u64,
    #[serde(default)]
    pub exposed_ports: Vec<PortBinding>,
    /// Container port -> host port, populated by `inspect`.
    #[serde(default)]
    pub host_ports: HashMap<String, String>,
    pub restart_policy: RestartPolicy,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_time: Option<DateTime<Utc>>,
    /// Opaque engine-assigned id; empty until the task has ever run.
    #[serde(default)]
    pub container_id: String,
    /// Relative URL the health loop probes on the task's own host port.
    #[serde(default)]
    pub health_check: Option<String>,
    #[serde(default)]
    pub restart_count: u32,
}

impl Task {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            state: TaskState::Pending,
            event: TaskEventKind::SpinUp,
            image: image.into(),
            cpu: 0.0,
            memory_bytes: 0,
            disk_bytes: 0,
            exposed_ports: Vec::new(),
            host_ports: HashMap::new(),
            restart_policy: RestartPolicy::No,
            start_time: None,
            finish_time: None,
            container_id: String::new(),
            health_check: None,
            restart_count: 0,
        }
    }

    /// "The first entry" of an unordered map — any entry is acceptable,
    /// callers must not depend on which one.
    pub fn host_port(&self) -> Option<(&str, &str)> {
        self.host_ports.iter().next().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_ever_run(&self) -> bool {
        !self.container_id.is_empty()
    }

    pub fn can_auto_restart(&self) -> bool {
        self.restart_count < MAX_RESTARTS
    }
}

/// A command carrying a desired state transition. Immutable once
/// created; the Manager's EventDb is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskEvent {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    /// Desired state — selects the FSM dispatch arm; the computed next
    /// state (not this field) is what `valid_transition` checks.
    pub state: TaskState,
    pub task: Task,
}

impl TaskEvent {
    pub fn new(state: TaskState, task: Task, now: DateTime<Utc>) -> Self {
        Self { id: EventId::new(), timestamp: now, state, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_pending_with_no_container() {
        let t = Task::new("web", "nginx:latest");
        assert_eq!(t.state, TaskState::Pending);
        assert!(!t.has_ever_run());
        assert!(t.can_auto_restart());
    }

    #[test]
    fn host_port_returns_some_entry_when_present() {
        let mut t = Task::new("web", "nginx:latest");
        t.host_ports.insert("80/tcp".into(), "32768".into());
        assert_eq!(t.host_port(), Some(("80/tcp", "32768")));
    }

    #[test]
    fn host_port_none_when_empty() {
        let t = Task::new("web", "nginx:latest");
        assert_eq!(t.host_port(), None);
    }

    #[test]
    fn restart_count_gate_trips_at_max() {
        let mut t = Task::new("web", "nginx:latest");
        t.restart_count = MAX_RESTARTS;
        assert!(!t.can_auto_restart());
    }

    #[test]
    fn rejects_unknown_fields_in_wire_form() {
        let json = r#"{
            "id": "11111111-1111-1111-1111-111111111111",
            "name": "web",
            "state": "pending",
            "event": "spin_up",
            "image": "nginx:latest",
            "cpu": 0.0,
            "memory_bytes": 0,
            "disk_bytes": 0,
            "restart_policy": "no",
            "bogus_field": true
        }"#;
        let result: Result<Task, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
