// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host metrics collection (C3) — contract only. Exposes a single
//! snapshot call; the periodic cadence and the bounded publish queue
//! live in `stv-worker`.

mod linux;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use linux::LinuxStatsProvider;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStatsProvider;

use async_trait::async_trait;
use stv_core::NodeStats;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to read {path}: {source}")]
    Read { path: &'static str, source: std::io::Error },
    #[error("could not parse {field} from {path}")]
    Parse { path: &'static str, field: &'static str },
}

#[async_trait]
pub trait NodeStatsProvider: Send + Sync {
    async fn snapshot(&self) -> Result<NodeStats, StatsError>;
}
