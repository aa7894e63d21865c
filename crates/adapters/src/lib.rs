// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stv-adapters: the two external-collaborator boundaries the Worker
//! depends on — a container engine and a host metrics reader. Both are
//! contracts with a real Linux/Docker implementation and an in-memory
//! test double.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod engine;
pub mod stats;

pub use engine::{ContainerEngine, DockerEngine, EngineError, Inspection};
#[cfg(any(test, feature = "test-support"))]
pub use engine::{EngineCall, FakeEngine};
pub use stats::{LinuxStatsProvider, NodeStatsProvider, StatsError};
#[cfg(any(test, feature = "test-support"))]
pub use stats::FakeStatsProvider;
