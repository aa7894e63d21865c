// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container engine adapter (C2) — contract only. The Worker never talks
//! to a container runtime directly; it goes through this trait so the
//! FSM-driving code in `stv-worker` stays engine-agnostic.

pub(crate) mod docker;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use docker::DockerEngine;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{EngineCall, FakeEngine};

use async_trait::async_trait;
use stv_core::ContainerConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine request timed out")]
    Timeout,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("engine returned an error: {0}")]
    Remote(String),
    #[error("malformed engine response: {0}")]
    Decode(String),
}

/// Inspection result for a running or exited container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Docker's `State.Status` string: `"running"`, `"exited"`, etc.
    pub status: String,
    /// Container port (e.g. `"80/tcp"`) -> host port.
    pub network_ports: std::collections::HashMap<String, String>,
}

impl Inspection {
    pub fn has_exited(&self) -> bool {
        self.status == "exited"
    }
}

/// Pull, create, start, stop, remove, and inspect a single container.
///
/// Implementations may pool client handles; the contract only requires
/// one free handle per concurrent caller.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Pull the image, create, and start the container. Returns the
    /// engine-assigned container id.
    async fn run(&self, config: &ContainerConfig) -> Result<String, EngineError>;

    /// Stop the container, then remove it (including its volumes), not
    /// forced.
    async fn stop(&self, container_id: &str) -> Result<(), EngineError>;

    /// Current status and observed host-port bindings.
    async fn inspect(&self, container_id: &str) -> Result<Inspection, EngineError>;
}
