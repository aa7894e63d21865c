// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `ContainerEngine` double for Worker and Manager tests.

use super::{ContainerEngine, EngineError, Inspection};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use stv_core::ContainerConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Run(String),
    Stop(String),
    Inspect(String),
}

struct State {
    calls: Vec<EngineCall>,
    containers: HashMap<String, Inspection>,
    fail_run: bool,
    next_id: u64,
}

/// Records every call it receives and answers `run`/`inspect` from an
/// in-memory table the test populates, instead of touching a real daemon.
pub struct FakeEngine {
    state: Mutex<State>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self { state: Mutex::new(State { calls: Vec::new(), containers: HashMap::new(), fail_run: false, next_id: 0 }) }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// Make the next `run` call fail, as if the image pull or start failed.
    pub fn fail_next_run(&self) {
        self.state.lock().fail_run = true;
    }

    /// Seed `inspect`'s answer for a container id the test already knows.
    pub fn set_inspection(&self, container_id: &str, inspection: Inspection) {
        self.state.lock().containers.insert(container_id.to_string(), inspection);
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn run(&self, config: &ContainerConfig) -> Result<String, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Run(config.name.clone()));
        if state.fail_run {
            state.fail_run = false;
            return Err(EngineError::Remote("fake: forced run failure".into()));
        }
        state.next_id += 1;
        let id = format!("fake-{:08x}", state.next_id);
        state.containers.insert(id.clone(), Inspection { status: "running".into(), network_ports: HashMap::new() });
        Ok(id)
    }

    async fn stop(&self, container_id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Stop(container_id.to_string()));
        state.containers.remove(container_id);
        Ok(())
    }

    async fn inspect(&self, container_id: &str) -> Result<Inspection, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Inspect(container_id.to_string()));
        state
            .containers
            .get(container_id)
            .cloned()
            .ok_or_else(|| EngineError::Remote(format!("no such container: {container_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ContainerConfig {
        ContainerConfig {
            name: "web".into(),
            image: "nginx:latest".into(),
            cpu: 0.5,
            memory_bytes: 1024,
            exposed_ports: Vec::new(),
            restart_policy: stv_core::RestartPolicy::No,
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn run_then_inspect_reports_running() {
        let engine = FakeEngine::new();
        let id = engine.run(&config()).await.unwrap();
        let inspection = engine.inspect(&id).await.unwrap();
        assert_eq!(inspection.status, "running");
    }

    #[tokio::test]
    async fn forced_failure_is_one_shot() {
        let engine = FakeEngine::new();
        engine.fail_next_run();
        assert!(engine.run(&config()).await.is_err());
        assert!(engine.run(&config()).await.is_ok());
    }

    #[tokio::test]
    async fn stop_removes_the_container_from_inspection() {
        let engine = FakeEngine::new();
        let id = engine.run(&config()).await.unwrap();
        engine.stop(&id).await.unwrap();
        assert!(engine.inspect(&id).await.is_err());
    }
}
