// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Manager's HTTP surface. Thin translation between wire JSON and
//! [`Manager`] calls; wired into a [`stv_transport::Handler`] by the
//! daemon binary.

use crate::controller::Manager;
use chrono::Utc;
use stv_core::{Clock, TaskEvent, TaskState};
use stv_scheduler::SchedulerPolicy;
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

fn empty(status: u16) -> Response {
    Response::empty(status)
}

fn task_id_from_path(path: &str, prefix: &str) -> Option<String> {
    path.strip_prefix(prefix).map(|s| s.trim_start_matches('/').to_string())
}

/// `GET /tasks` -> every task the Manager knows about.
pub async fn list_tasks<C: Clock, P: SchedulerPolicy>(manager: &Manager<C, P>) -> Response {
    ok_body(200, manager.list_tasks())
}

/// `POST /tasks`, body = `TaskEvent`. Malformed bodies (including
/// unrecognised fields) are 404 per the Manager API table; a well-formed
/// event is always accepted (201) even if dispatch itself later drops
/// it — acceptance and placement are separate concerns; a client whose
/// task got dropped is expected to resubmit.
pub async fn create_task<C: Clock, P: SchedulerPolicy>(manager: &Manager<C, P>, body: &str) -> Response {
    let event: TaskEvent = match serde_json::from_str(body) {
        Ok(e) => e,
        Err(e) => return err_body(404, format!("malformed task event: {e}")),
    };
    let submitted = event.task.clone();
    let task_id = submitted.id;
    manager.submit(event).await;
    let task = manager.get_task(task_id).unwrap_or(submitted);
    ok_body(201, task)
}

/// `DELETE /tasks/{taskId}` -> 406 on an empty id, 404 on an unknown
/// one, 204 once the stop event has been accepted.
pub async fn delete_task<C: Clock, P: SchedulerPolicy>(manager: &Manager<C, P>, raw_id: &str) -> Response {
    if raw_id.is_empty() {
        return err_body(406, "task id must not be empty");
    }
    let Ok(id) = raw_id.parse() else {
        return err_body(404, "task id is not a valid uuid");
    };
    let Some(task) = manager.get_task(id) else {
        return err_body(404, "unknown task id");
    };
    let event = TaskEvent::new(TaskState::Completed, task, Utc::now());
    manager.submit(event).await;
    empty(204)
}

pub async fn route<C: Clock, P: SchedulerPolicy>(manager: &Manager<C, P>, req: Request) -> Response {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/tasks") => list_tasks(manager).await,
        ("POST", "/tasks") => create_task(manager, &req.body).await,
        ("DELETE", path) if path.starts_with("/tasks/") => {
            let id = task_id_from_path(path, "/tasks").unwrap_or_default();
            delete_task(manager, &id).await
        }
        _ => err_body(404, "no such route"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stv_core::{FakeClock, Node, NodeRole, SystemClock};
    use stv_scheduler::RoundRobin;

    fn manager() -> Manager<SystemClock, RoundRobin> {
        Manager::new(RoundRobin::new(), SystemClock)
    }

    fn manager_with_worker(addr: &str) -> Manager<FakeClock, RoundRobin> {
        let m = Manager::new(
            RoundRobin::new(),
            FakeClock::new(chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 1, 1, 0, 0, 0).unwrap()),
        );
        m.register_worker(
            addr,
            Node {
                name: "w1".into(),
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
            },
        );
        m
    }

    #[tokio::test]
    async fn create_rejects_malformed_body() {
        let m = manager();
        let resp = create_task(&m, "not json").await;
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn create_with_no_workers_still_accepts_the_submission() {
        let m = manager();
        let task = stv_core::Task::new("web", "nginx");
        let event = TaskEvent::new(TaskState::Pending, task, Utc::now());
        let body = serde_json::to_string(&event).unwrap();
        let resp = create_task(&m, &body).await;
        assert_eq!(resp.status, 201);
        assert!(resp.body.contains("\"state\":\"pending\""));
    }

    #[tokio::test]
    async fn delete_rejects_empty_id_with_406() {
        let m = manager();
        let resp = delete_task(&m, "").await;
        assert_eq!(resp.status, 406);
    }

    #[tokio::test]
    async fn delete_reports_404_for_unknown_id() {
        let m = manager();
        let resp = delete_task(&m, "11111111-1111-1111-1111-111111111111").await;
        assert_eq!(resp.status, 404);
    }

    #[tokio::test]
    async fn route_dispatches_get_tasks() {
        let m = manager();
        let resp = route(&m, Request { method: "GET".into(), path: "/tasks".into(), body: String::new() }).await;
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn placement_transport_failure_still_registers_the_task_as_scheduled() {
        let m = manager_with_worker("127.0.0.1:1");
        let task = stv_core::Task::new("web", "nginx");
        let event = TaskEvent::new(TaskState::Pending, task, Utc::now());
        let body = serde_json::to_string(&event).unwrap();
        let resp = create_task(&m, &body).await;
        // the task was written through to TaskDb as Scheduled before the
        // failed POST re-enqueued the event, so the response reports it.
        assert_eq!(resp.status, 201);
        assert!(resp.body.contains("\"state\":\"scheduled\""));
    }
}
