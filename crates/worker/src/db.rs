// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker's task table. Append-only from the FSM's point of view —
//! terminal tasks stay queryable rather than being dropped.

use parking_lot::Mutex;
use std::collections::HashMap;
use stv_core::{Task, TaskId};

#[derive(Default)]
pub struct Db {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl Db {
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

    pub fn list_ids(&self) -> Vec<TaskId> {
        self.tasks.lock().keys().copied().collect()
    }
}
