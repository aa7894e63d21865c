// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stv-manager: the fleet coordinator (C6). Owns the admission queue,
//! task/event tables, and worker roster; runs dispatch synchronously per
//! request and reconciliation/health on their own periodic loops.

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod controller;
mod cpu_source;
mod db;
mod handlers;
mod queue;
mod roster;

pub use controller::{DispatchOutcome, Manager, ReconcileError};
pub use cpu_source::HttpCpuUsageSource;
pub use handlers::route;
