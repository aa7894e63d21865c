// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker's task runner (C4): a single-step FSM driver plus the
//! three periodic loops that keep it moving without client involvement.

use crate::db::Db;
use crate::queue::Queue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use stv_adapters::{ContainerEngine, NodeStatsProvider};
use stv_core::{next, valid_transition, Clock, ContainerConfig, NodeStats, Task, TaskEvent, TaskId, TaskState};
use tokio::sync::mpsc;

/// Outcome of a single `run_once` step — structured, never a panic.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Queue was empty; nothing to do.
    NoOp,
    /// The intent moved the task from `from` to `to`.
    Advanced { id: TaskId, from: TaskState, to: TaskState },
    /// The computed transition was not legal; no mutation happened.
    InvalidTransition { from: TaskState, to: TaskState },
    /// The dispatch arm reached is not one the FSM table produces.
    Unreachable { state: TaskState },
}

/// Drives one task's local FSM forward, using an engine adapter and a
/// stats source it doesn't own — both injected at construction rather
/// than reached for as globals.
pub struct Worker<C: Clock> {
    db: Db,
    queue: Queue,
    engine: Arc<dyn ContainerEngine>,
    stats: Arc<dyn NodeStatsProvider>,
    clock: C,
}

impl<C: Clock> Worker<C> {
    pub fn new(engine: Arc<dyn ContainerEngine>, stats: Arc<dyn NodeStatsProvider>, clock: C) -> Self {
        Self { db: Db::new(), queue: Queue::new(), engine, stats, clock }
    }

    /// Enqueue at the tail; O(1).
    pub fn add_task(&self, event: TaskEvent) {
        self.queue.push(event);
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.db.list()
    }

    pub fn list_task_ids(&self) -> Vec<TaskId> {
        self.db.list_ids()
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.db.get(id)
    }

    pub fn clock_now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Dequeue one intent and advance it one step.
    pub async fn run_once(&self) -> RunOutcome {
        let Some(intent) = self.queue.pop() else {
            return RunOutcome::NoOp;
        };

        let persisted = match self.db.get(intent.task.id) {
            Some(p) => p,
            None => {
                self.db.upsert(intent.task.clone());
                intent.task.clone()
            }
        };

        let next_state = next(persisted.state, intent.task.event);
        if !valid_transition(persisted.state, next_state) {
            tracing::info!(
                task_id = %persisted.id,
                from = %persisted.state,
                to = %next_state,
                "invalid transition, dropping intent"
            );
            return RunOutcome::InvalidTransition { from: persisted.state, to: next_state };
        }

        match intent.state {
            TaskState::Pending => {
                let mut advanced = persisted.clone();
                advanced.state = next_state;
                self.db.upsert(advanced.clone());
                self.queue.push(TaskEvent::new(advanced.state, advanced.clone(), self.clock.now()));
                RunOutcome::Advanced { id: advanced.id, from: persisted.state, to: next_state }
            }
            TaskState::Scheduled => {
                let mut advanced = persisted.clone();
                let config = ContainerConfig::from_task(&advanced);
                match self.engine.run(&config).await {
                    Ok(container_id) => {
                        advanced.state = TaskState::Running;
                        advanced.container_id = container_id;
                        advanced.start_time = Some(self.clock.now());
                    }
                    Err(e) => {
                        tracing::warn!(task_id = %advanced.id, error = %e, "engine run failed");
                        advanced.state = TaskState::Failed;
                    }
                }
                self.db.upsert(advanced.clone());
                RunOutcome::Advanced { id: advanced.id, from: persisted.state, to: advanced.state }
            }
            TaskState::Completed => {
                let mut advanced = persisted.clone();
                if let Err(e) = self.engine.stop(&advanced.container_id).await {
                    tracing::warn!(task_id = %advanced.id, error = %e, "engine stop failed");
                }
                advanced.finish_time = Some(self.clock.now());
                advanced.state = TaskState::Completed;
                self.db.upsert(advanced.clone());
                RunOutcome::Advanced { id: advanced.id, from: persisted.state, to: TaskState::Completed }
            }
            other => RunOutcome::Unreachable { state: other },
        }
    }

    /// Calls `run_once` whenever the queue is non-empty, every `tick`.
    pub async fn run_periodically(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            if !self.queue.is_empty() {
                self.run_once().await;
            }
        }
    }

    /// For every locally-known Running task, inspect the container; an
    /// `exited` status fails it, and observed port bindings are copied
    /// in regardless of status.
    pub async fn update_tasks_periodically(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            self.update_tasks_once().await;
        }
    }

    async fn update_tasks_once(&self) {
        for task in self.db.list() {
            if task.state != TaskState::Running {
                continue;
            }
            match self.engine.inspect(&task.container_id).await {
                Ok(inspection) => {
                    let mut updated = task.clone();
                    if inspection.has_exited() {
                        updated.state = TaskState::Failed;
                    }
                    updated.host_ports = inspection.network_ports;
                    self.db.upsert(updated);
                }
                Err(e) => {
                    tracing::warn!(task_id = %task.id, error = %e, "container inspect failed");
                }
            }
        }
    }

    /// Publishes a bounded stream of metric snapshots. The producer
    /// blocks when the consumer lags rather than dropping samples.
    pub fn collect_stats(self: Arc<Self>, period: Duration, buffer: usize) -> mpsc::Receiver<NodeStats> {
        let (tx, rx) = mpsc::channel(buffer);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match self.stats.snapshot().await {
                    Ok(snapshot) => {
                        if tx.send(snapshot).await.is_err() {
                            break; // receiver dropped
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "stats snapshot failed"),
                }
            }
        });
        rx
    }

    /// Latest node stats, if the metrics publisher has sampled at least
    /// once — used by the `/stats` handler.
    pub async fn latest_stats(&self) -> Result<NodeStats, stv_adapters::StatsError> {
        self.stats.snapshot().await
    }

    pub fn host_ports_snapshot(&self, id: TaskId) -> HashMap<String, String> {
        self.db.get(id).map(|t| t.host_ports).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stv_adapters::{FakeEngine, FakeStatsProvider};
    use stv_core::{SystemClock, Task, TaskEventKind};

    fn worker() -> Arc<Worker<SystemClock>> {
        Arc::new(Worker::new(
            Arc::new(FakeEngine::new()),
            Arc::new(FakeStatsProvider::new(vec![NodeStats::default()])),
            SystemClock,
        ))
    }

    fn pending_event(name: &str) -> TaskEvent {
        let mut task = Task::new(name, "nginx:latest");
        task.event = TaskEventKind::SpinUp;
        TaskEvent::new(TaskState::Pending, task, Utc::now())
    }

    #[tokio::test]
    async fn empty_queue_returns_noop_with_no_side_effects() {
        let w = worker();
        assert_eq!(w.run_once().await, RunOutcome::NoOp);
        assert!(w.list_tasks().is_empty());
    }

    #[tokio::test]
    async fn s1_pending_to_scheduled_to_running() {
        let w = worker();
        let event = pending_event("web");
        let id = event.task.id;
        w.add_task(event);

        let first = w.run_once().await;
        assert_eq!(first, RunOutcome::Advanced { id, from: TaskState::Pending, to: TaskState::Scheduled });
        assert_eq!(w.get_task(id).unwrap().state, TaskState::Scheduled);

        let second = w.run_once().await;
        assert_eq!(second, RunOutcome::Advanced { id, from: TaskState::Scheduled, to: TaskState::Running });
        let task = w.get_task(id).unwrap();
        assert_eq!(task.state, TaskState::Running);
        assert!(task.has_ever_run());
        assert!(task.start_time.is_some());
    }

    #[tokio::test]
    async fn s3_engine_failure_during_scheduled_marks_failed() {
        let engine = Arc::new(FakeEngine::new());
        engine.fail_next_run();
        let w = Arc::new(Worker::new(engine, Arc::new(FakeStatsProvider::new(vec![NodeStats::default()])), SystemClock));
        let event = pending_event("web");
        let id = event.task.id;
        w.add_task(event);
        w.run_once().await; // Pending -> Scheduled
        let outcome = w.run_once().await; // Scheduled -> run() fails -> Failed
        assert_eq!(outcome, RunOutcome::Advanced { id, from: TaskState::Scheduled, to: TaskState::Failed });
    }

    #[tokio::test]
    async fn invalid_transition_leaves_state_unchanged() {
        let w = worker();
        let mut task = Task::new("web", "img");
        task.state = TaskState::Completed;
        w.db.upsert(task.clone());
        let bad = TaskEvent::new(TaskState::Running, task.clone(), Utc::now());
        w.add_task(bad);
        let outcome = w.run_once().await;
        assert!(matches!(outcome, RunOutcome::InvalidTransition { .. }));
        assert_eq!(w.get_task(task.id).unwrap().state, TaskState::Completed);
    }

    #[tokio::test]
    async fn s2_completed_intent_stops_the_container() {
        let engine = Arc::new(FakeEngine::new());
        let w = Arc::new(Worker::new(
            Arc::clone(&engine) as Arc<dyn ContainerEngine>,
            Arc::new(FakeStatsProvider::new(vec![NodeStats::default()])),
            SystemClock,
        ));
        let mut task = Task::new("web", "img");
        task.state = TaskState::Running;
        task.container_id = "c1".into();
        w.db.upsert(task.clone());

        let stop_event = TaskEvent::new(TaskState::Completed, task.clone(), Utc::now());
        w.add_task(stop_event);
        let outcome = w.run_once().await;
        assert_eq!(
            outcome,
            RunOutcome::Advanced { id: task.id, from: TaskState::Running, to: TaskState::Completed }
        );
        assert!(w.get_task(task.id).unwrap().finish_time.is_some());
    }

    #[tokio::test]
    async fn update_tasks_once_fails_exited_containers_and_copies_ports() {
        let engine = Arc::new(FakeEngine::new());
        let w = Worker::new(
            Arc::clone(&engine) as Arc<dyn ContainerEngine>,
            Arc::new(FakeStatsProvider::new(vec![NodeStats::default()])),
            SystemClock,
        );
        let mut task = Task::new("web", "img");
        task.state = TaskState::Running;
        task.container_id = "c1".into();
        w.db.upsert(task.clone());
        let mut ports = std::collections::HashMap::new();
        ports.insert("80/tcp".to_string(), "32768".to_string());
        engine.set_inspection(
            "c1",
            stv_adapters::Inspection { status: "exited".into(), network_ports: ports.clone() },
        );

        w.update_tasks_once().await;
        let updated = w.get_task(task.id).unwrap();
        assert_eq!(updated.state, TaskState::Failed);
        assert_eq!(updated.host_ports, ports);
    }
}
