// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Manager Controller: admission queue, task/event tables, worker
//! roster, and the three algorithms that move tasks across the fleet —
//! dispatch, reconciliation, and health-driven restart.

use crate::db::{EventDb, TaskDb};
use crate::queue::PendingQueue;
use crate::roster::Roster;
use std::sync::Arc;
use std::time::Duration;
use stv_core::{valid_transition, Clock, Task, TaskEvent, TaskId, TaskState};
use stv_scheduler::SchedulerPolicy;
use stv_transport::StandardResponse;
use thiserror::Error;

/// Outcome of one `send_work` invocation — every branch named explicitly
/// so callers (and tests) can assert on it without scraping logs.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// PendingQueue was empty.
    NoOp,
    /// Re-dispatch branch: a `DELETE` was sent to the owning worker.
    ReDispatchedStop { task_id: TaskId, endpoint: String },
    /// Re-dispatch branch: the transition wasn't legal; event dropped.
    ReDispatchInvalid { task_id: TaskId },
    /// Re-dispatch branch: the `DELETE` itself failed; logged, not retried.
    StopFailed { task_id: TaskId },
    /// New-placement branch: scheduler found a worker and the POST succeeded.
    Placed { task_id: TaskId, endpoint: String },
    /// New-placement branch: no candidate node passed `filter`.
    NoCandidate { task_id: TaskId },
    /// New-placement branch: transport error, re-enqueued for retry.
    TransportErrorRequeued { task_id: TaskId },
    /// New-placement branch: non-201 response, permanently dropped.
    RejectedByWorker { task_id: TaskId, status: u16 },
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("worker {0} unreachable: {1}")]
    Transport(String, String),
    #[error("worker {0} returned status {1}")]
    Status(String, u16),
    #[error("worker {0} sent an undecodable body: {1}")]
    Decode(String, String),
}

pub struct Manager<C: Clock, P: SchedulerPolicy> {
    pending: PendingQueue,
    task_db: TaskDb,
    event_db: EventDb,
    roster: Roster,
    // async-aware: `score` is a multi-second suspension point (EPVM's CPU
    // sample), so this lock must not be a sync mutex held across .await.
    scheduler: tokio::sync::Mutex<P>,
    clock: C,
}

impl<C: Clock, P: SchedulerPolicy> Manager<C, P> {
    pub fn new(scheduler: P, clock: C) -> Self {
        Self {
            pending: PendingQueue::new(),
            task_db: TaskDb::new(),
            event_db: EventDb::new(),
            roster: Roster::new(),
            scheduler: tokio::sync::Mutex::new(scheduler),
            clock,
        }
    }

    pub fn register_worker(&self, endpoint: impl Into<String>, node: stv_core::Node) {
        self.roster.register(endpoint, node);
    }

    pub fn get_task(&self, id: TaskId) -> Option<Task> {
        self.task_db.get(id)
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.task_db.list()
    }

    pub fn task_db_contains(&self, id: TaskId) -> bool {
        self.task_db.contains(id)
    }

    pub fn event_count(&self) -> usize {
        self.event_db.len()
    }

    /// Submit a client-provided event: enqueue it, then run exactly one
    /// dispatch invocation, synchronous with this call.
    pub async fn submit(&self, event: TaskEvent) -> DispatchOutcome {
        self.pending.push(event);
        self.send_work().await
    }

    /// The dispatch step. Pops at most one event and acts on it.
    pub async fn send_work(&self) -> DispatchOutcome {
        let Some(te) = self.pending.pop() else {
            return DispatchOutcome::NoOp;
        };
        self.event_db.record(te.clone());
        let task_id = te.task.id;

        if let Some(endpoint) = self.roster.worker_for_task(task_id) {
            return self.redispatch(te, endpoint).await;
        }
        self.place(te).await
    }

    async fn redispatch(&self, te: TaskEvent, endpoint: String) -> DispatchOutcome {
        let task_id = te.task.id;
        let persisted_state = self.task_db.get(task_id).map(|t| t.state);
        let transition_ok =
            persisted_state.is_some_and(|s| valid_transition(s, TaskState::Completed));

        if te.state != TaskState::Completed || !transition_ok {
            tracing::info!(task_id = %task_id, "invalid transition on re-dispatch, dropping event");
            return DispatchOutcome::ReDispatchInvalid { task_id };
        }

        match stv_transport::delete(&endpoint, &format!("/tasks/{task_id}")).await {
            Ok(resp) if resp.status == 200 => {
                if let Some(mut task) = self.task_db.get(task_id) {
                    task.state = TaskState::Completed;
                    self.task_db.upsert(task);
                }
                DispatchOutcome::ReDispatchedStop { task_id, endpoint }
            }
            Ok(resp) => {
                tracing::warn!(task_id = %task_id, status = resp.status, "worker rejected stop");
                DispatchOutcome::RejectedByWorker { task_id, status: resp.status }
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "stop request failed, not retried");
                DispatchOutcome::StopFailed { task_id }
            }
        }
    }

    async fn place(&self, mut te: TaskEvent) -> DispatchOutcome {
        let task_id = te.task.id;
        let nodes = self.roster.nodes();

        let candidates = self.scheduler.lock().await.filter(&te.task, &nodes);
        if candidates.is_empty() {
            tracing::info!(task_id = %task_id, "no candidate node, dropping event");
            return DispatchOutcome::NoCandidate { task_id };
        }

        let scores = self.scheduler.lock().await.score(&te.task, &candidates).await;
        let picked = self.scheduler.lock().await.pick(&scores, &candidates);

        let Some(node) = picked else {
            tracing::info!(task_id = %task_id, "scheduler picked nothing, dropping event");
            return DispatchOutcome::NoCandidate { task_id };
        };
        let worker_endpoint = node.addr.clone();

        self.roster.assign(task_id, &worker_endpoint);
        te.task.state = TaskState::Scheduled;
        self.task_db.upsert(te.task.clone());

        let body = serde_json::to_string(&te).unwrap_or_default();
        match stv_transport::post(&worker_endpoint, "/tasks", &body).await {
            Ok(resp) if resp.status == 201 => DispatchOutcome::Placed { task_id, endpoint: worker_endpoint },
            Ok(resp) => {
                tracing::warn!(task_id = %task_id, status = resp.status, "worker rejected placement, dropping");
                DispatchOutcome::RejectedByWorker { task_id, status: resp.status }
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "dispatch transport error, re-enqueuing");
                self.pending.push(te);
                DispatchOutcome::TransportErrorRequeued { task_id }
            }
        }
    }

    /// Backstop sweep over the admission queue. Dispatch itself is
    /// synchronous with the triggering API call; this loop only exists
    /// so an event re-enqueued after a transport failure doesn't sit
    /// forever if no further client request happens to drain it.
    pub async fn drain_pending_periodically(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            while !self.pending.is_empty() {
                self.send_work().await;
            }
        }
    }

    /// Reconciliation loop (12 s default). Aborts the remainder of the
    /// tick on the first worker failure — preserved by design, not
    /// "fixed" to continue past errors.
    pub async fn update_tasks_periodically(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            if let Err(e) = self.reconcile_once().await {
                tracing::warn!(error = %e, "reconciliation tick aborted");
            }
        }
    }

    async fn reconcile_once(&self) -> Result<(), ReconcileError> {
        for endpoint in self.roster.endpoints() {
            let resp = stv_transport::get(&endpoint, "/tasks")
                .await
                .map_err(|e| ReconcileError::Transport(endpoint.clone(), e.to_string()))?;
            if resp.status != 200 {
                return Err(ReconcileError::Status(endpoint.clone(), resp.status));
            }
            let envelope: StandardResponse<Vec<Task>> = serde_json::from_str(&resp.body)
                .map_err(|e| ReconcileError::Decode(endpoint.clone(), e.to_string()))?;
            for observed in envelope.response.unwrap_or_default() {
                if let Some(mut persisted) = self.task_db.get(observed.id) {
                    persisted.state = observed.state;
                    persisted.start_time = observed.start_time;
                    persisted.finish_time = observed.finish_time;
                    persisted.container_id = observed.container_id;
                    persisted.host_ports = observed.host_ports;
                    self.task_db.upsert(persisted);
                }
            }
        }
        Ok(())
    }

    /// Health loop (18 s default).
    pub async fn do_health_checks_periodically(self: Arc<Self>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            self.health_check_once().await;
        }
    }

    async fn health_check_once(&self) {
        for task in self.task_db.list() {
            match task.state {
                TaskState::Dropped => continue,
                TaskState::Running if task.can_auto_restart() => {
                    let Some(endpoint) = self.roster.worker_for_task(task.id) else { continue };
                    if !self.probe_health(&task, &endpoint).await {
                        self.restart(task.id).await;
                    }
                }
                TaskState::Failed if task.can_auto_restart() => {
                    self.restart(task.id).await;
                }
                _ => {}
            }
        }
    }

    async fn probe_health(&self, task: &Task, endpoint: &str) -> bool {
        let Some((_, host_port)) = task.host_port() else { return false };
        let host = endpoint.split(':').next().unwrap_or(endpoint);
        let path = task.health_check.as_deref().unwrap_or("/");
        let addr = format!("{host}:{host_port}");
        matches!(stv_transport::get(&addr, path).await, Ok(resp) if resp.status == 200)
    }

    /// Re-run a task on its *current* worker — no reschedule.
    pub async fn restart(&self, task_id: TaskId) {
        let Some(endpoint) = self.roster.worker_for_task(task_id) else { return };
        let Some(mut task) = self.task_db.get(task_id) else { return };

        task.state = TaskState::Scheduled;
        task.restart_count += 1;
        self.task_db.upsert(task.clone());

        let event = TaskEvent::new(TaskState::Running, task.clone(), self.clock.now());
        self.event_db.record(event.clone());

        let body = serde_json::to_string(&event).unwrap_or_default();
        match stv_transport::post(&endpoint, "/tasks", &body).await {
            Ok(resp) if resp.status == 201 => {}
            Ok(resp) => {
                tracing::warn!(task_id = %task_id, status = resp.status, "worker rejected restart, dropping");
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "restart transport error, re-enqueuing");
                self.pending.push(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stv_core::{FakeClock, Node, NodeRole, Task as TaskModel};
    use stv_scheduler::RoundRobin;

    fn clock() -> FakeClock {
        FakeClock::new(chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 1, 1, 0, 0, 0).unwrap())
    }

    fn node(name: &str, addr: &str) -> Node {
        Node {
            name: name.into(),
            addr: addr.into(),
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

    #[tokio::test]
    async fn empty_pending_queue_is_a_noop() {
        let m = Manager::new(RoundRobin::new(), clock());
        assert_eq!(m.send_work().await, DispatchOutcome::NoOp);
    }

    #[tokio::test]
    async fn no_registered_workers_drops_the_event() {
        let m = Manager::new(RoundRobin::new(), clock());
        let task = TaskModel::new("web", "nginx");
        let id = task.id;
        let event = TaskEvent::new(TaskState::Pending, task, Utc::now());
        let outcome = m.submit(event).await;
        assert_eq!(outcome, DispatchOutcome::NoCandidate { task_id: id });
    }

    #[tokio::test]
    async fn placement_fails_over_to_requeue_when_worker_unreachable() {
        let m = Manager::new(RoundRobin::new(), clock());
        m.register_worker("127.0.0.1:1", node("w1", "127.0.0.1:1"));
        let task = TaskModel::new("web", "nginx");
        let id = task.id;
        let event = TaskEvent::new(TaskState::Pending, task, Utc::now());
        let outcome = m.submit(event).await;
        assert_eq!(outcome, DispatchOutcome::TransportErrorRequeued { task_id: id });
        // registration into TaskWorkerMap happened before the POST was
        // attempted, so the re-enqueued retry is now routed
        // through the re-dispatch branch rather than placed again — it
        // carries the original Pending target, which isn't a legal
        // re-dispatch, so it's dropped rather than retried forever.
        assert_eq!(m.send_work().await, DispatchOutcome::ReDispatchInvalid { task_id: id });
    }

    #[test]
    fn invariant_worker_task_map_matches_task_worker_map() {
        let m = Manager::new(RoundRobin::new(), clock());
        m.register_worker("w1:9000", node("w1", "w1:9000"));
        let id = TaskId::new();
        m.roster.assign(id, "w1:9000");
        assert_eq!(m.roster.assigned_task_count(), m.roster.task_worker_count());
    }
}
