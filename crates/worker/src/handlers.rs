// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Worker's HTTP surface: thin translation between wire JSON and
//! [`Worker`] calls. Wired into a [`stv_transport::Handler`] by the
//! daemon binary, not here — this module has no knowledge of sockets.

use crate::runner::Worker;
use chrono::Utc;
use std::sync::Arc;
use stv_core::{Clock, Task, TaskEvent, TaskEventKind, TaskState};
use stv_transport::{Request, Response, StandardResponse};

fn ok_body<T: serde::Serialize>(status: u16, payload: T) -> Response {
    let body = serde_json::to_string(&StandardResponse::ok(status, payload))
        .unwrap_or_else(|_| "{}".to_string());
    Response::json(status, body)
}

fn err_body(status: u16, message: impl Into<String>) -> Response {
    let body = serde_json::to_string(&StandardResponse::error(status, message))
        .unwrap_or_else(|_| "{}".to_string());
    Response::json(status, body)
}

fn task_id_from_path(path: &str, prefix: &str) -> Option<String> {
    path.strip_prefix(prefix).map(|s| s.trim_start_matches('/').to_string())
}

/// `GET /tasks` -> every task this Worker has ever been asked to run.
pub async fn list_tasks<C: Clock>(worker: &Worker<C>) -> Response {
    ok_body(200, worker.list_tasks())
}

/// `GET /tasks/ids` -> just the id column, for cheap polling.
pub async fn list_task_ids<C: Clock>(worker: &Worker<C>) -> Response {
    ok_body(200, worker.list_task_ids())
}

/// `GET /tasks/{taskId}` -> 400 on an empty id, 404 on an unknown one.
pub async fn get_task<C: Clock>(worker: &Worker<C>, raw_id: &str) -> Response {
    if raw_id.is_empty() {
        return err_body(400, "task id must not be empty");
    }
    let Ok(id) = raw_id.parse() else {
        return err_body(400, "task id is not a valid uuid");
    };
    match worker.get_task(id) {
        Some(task) => ok_body(200, task),
        None => err_body(404, "unknown task id"),
    }
}

/// `POST /tasks` -> accepts a task body, forces it onto the Pending/SpinUp
/// rails regardless of what the caller sent: state and event are
/// server-assigned, never client-supplied.
pub async fn create_task<C: Clock>(worker: &Worker<C>, body: &str) -> Response {
    let mut task: Task = match serde_json::from_str(body) {
        Ok(t) => t,
        Err(e) => return err_body(404, format!("malformed task body: {e}")),
    };
    task.state = TaskState::Pending;
    task.event = TaskEventKind::SpinUp;
    let event = TaskEvent::new(TaskState::Pending, task.clone(), worker.clock_now());
    worker.add_task(event);
    ok_body(201, task)
}

/// `DELETE /tasks/{taskId}` -> queues a SpinDown intent and returns the
/// task as it stands right now (the FSM step itself happens later, off
/// this request).
pub async fn delete_task<C: Clock>(worker: &Worker<C>, raw_id: &str) -> Response {
    if raw_id.is_empty() {
        return err_body(400, "task id must not be empty");
    }
    let Ok(id) = raw_id.parse() else {
        return err_body(400, "task id is not a valid uuid");
    };
    let Some(mut task) = worker.get_task(id) else {
        return err_body(404, "unknown task id");
    };
    task.event = TaskEventKind::SpinDown;
    let event = TaskEvent::new(TaskState::Completed, task.clone(), worker.clock_now());
    worker.add_task(event);
    ok_body(200, task)
}

/// `GET /stats` -> the latest host metrics snapshot.
pub async fn get_stats<C: Clock>(worker: &Worker<C>) -> Response {
    match worker.latest_stats().await {
        Ok(stats) => ok_body(200, stats),
        Err(e) => err_body(500, e.to_string()),
    }
}

/// Routes a parsed request to the handler above, mirroring the path
/// table in the Worker API section. Returns 404 for unmatched routes.
pub async fn route<C: Clock>(worker: &Arc<Worker<C>>, req: Request) -> Response {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/tasks") => list_tasks(worker).await,
        ("GET", "/tasks/ids") => list_task_ids(worker).await,
        ("POST", "/tasks") => create_task(worker, &req.body).await,
        ("GET", "/stats") => get_stats(worker).await,
        ("GET", path) if path.starts_with("/tasks/") => {
            let id = task_id_from_path(path, "/tasks").unwrap_or_default();
            get_task(worker, &id).await
        }
        ("DELETE", path) if path.starts_with("/tasks/") => {
            let id = task_id_from_path(path, "/tasks").unwrap_or_default();
            delete_task(worker, &id).await
        }
        _ => err_body(404, "no such route"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stv_adapters::{FakeEngine, FakeStatsProvider};
    use stv_core::{NodeStats, SystemClock};

    fn worker() -> Arc<Worker<SystemClock>> {
        Arc::new(Worker::new(
            Arc::new(FakeEngine::new()),
            Arc::new(FakeStatsProvider::new(vec![NodeStats::default()])),
            SystemClock,
        ))
    }

    #[tokio::test]
    async fn create_forces_pending_and_spin_up_regardless_of_body() {
        let w = worker();
        let body = r#"{
            "id": "11111111-1111-1111-1111-111111111111",
            "name": "web",
            "state": "running",
            "event": "spin_down",
            "image": "nginx:latest",
            "cpu": 0.5,
            "memory_bytes": 1024,
            "disk_bytes": 1024,
            "restart_policy": "no"
        }"#;
        let resp = create_task(&w, body).await;
        assert_eq!(resp.status, 201);
        assert!(resp.body.contains("\"state\":\"pending\""));
        assert!(resp.body.contains("\"event\":\"spin_up\""));
    }

    #[tokio::test]
    async fn create_rejects_malformed_body() {
        let w = worker();
        let resp = create_task(&w, "not json").await;
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn get_task_rejects_empty_id() {
        let w = worker();
        let resp = get_task(&w, "").await;
        assert_eq!(resp.status, 400);
    }

    #[tokio::test]
    async fn get_task_reports_404_for_unknown_id() {
        let w = worker();
        let resp = get_task(&w, "11111111-1111-1111-1111-111111111111").await;
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn delete_queues_spin_down_and_returns_current_task() {
        let w = worker();
        let create_resp = create_task(&w, r#"{"name":"web","image":"nginx","cpu":0,"memory_bytes":0,"disk_bytes":0,"exposed_ports":[],"host_ports":{},"restart_policy":"no"}"#).await;
        assert_eq!(create_resp.status, 201);
        let task: stv_transport::StandardResponse<Task> = serde_json::from_str(&create_resp.body).unwrap();
        let id = task.response.unwrap().id;

        let resp = delete_task(&w, &id.to_string()).await;
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn route_dispatches_get_tasks() {
        let w = worker();
        let resp = route(&w, Request { method: "GET".into(), path: "/tasks".into(), body: String::new() }).await;
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn route_reports_404_for_unknown_path() {
        let w = worker();
        let resp = route(&w, Request { method: "GET".into(), path: "/nope".into(), body: String::new() }).await;
        assert_eq!(resp.status, 404);
    }
}
