// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Manager's two authoritative tables: `TaskDb` (current task state,
//! mutated only by dispatch/reconciliation/health) and `EventDb`
//! (append-only history of every TaskEvent accepted).
//!
//! Neither table is ever pruned — documented, not fixed.

use parking_lot::Mutex;
use std::collections::HashMap;
use stv_core::{EventId, Task, TaskEvent, TaskId};

#[derive(Default)]
pub struct TaskDb {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.lock().get(&id).cloned()
    }

    pub fn upsert(&self, task: Task) {
        self.tasks.lock().insert(task.id, task);
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.lock().contains_key(&id)
    }

    pub fn list(&self) -> Vec<Task> {
        self.tasks.lock().values().cloned().collect()
    }
}

#[derive(Default)]
pub struct EventDb {
    events: Mutex<HashMap<EventId, TaskEvent>>,
}

impl EventDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: TaskEvent) {
        self.events.lock().insert(event.id, event);
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stv_core::{Task as TaskModel, TaskState};

    #[test]
    fn task_db_upsert_then_get_round_trips() {
        let db = TaskDb::new();
        let task = TaskModel::new("web", "nginx");
        let id = task.id;
        db.upsert(task.clone());
        assert_eq!(db.get(id), Some(task));
    }

    #[test]
    fn task_db_unknown_id_is_absent() {
        let db = TaskDb::new();
        assert!(!db.contains(TaskId::new()));
    }

    #[test]
    fn event_db_is_append_only_and_counts_distinct_events() {
        let db = EventDb::new();
        assert!(db.is_empty());
        let task = TaskModel::new("web", "nginx");
        db.record(TaskEvent::new(TaskState::Pending, task.clone(), Utc::now()));
        db.record(TaskEvent::new(TaskState::Completed, task, Utc::now()));
        assert_eq!(db.len(), 2);
    }
}
