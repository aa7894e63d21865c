// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Manager's pending-event admission queue. FIFO within itself;
//! nothing is guaranteed across workers or tasks.

use parking_lot::Mutex;
use std::collections::VecDeque;
use stv_core::TaskEvent;

#[derive(Default)]
pub struct PendingQueue {
    events: Mutex<VecDeque<TaskEvent>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: TaskEvent) {
        self.events.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<TaskEvent> {
        self.events.lock().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}
