// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stv-daemon: process wiring for the two long-running binaries,
//! `managerd` and `workerd`. Everything FSM/dispatch/scheduling lives in
//! `stv-core`/`stv-manager`/`stv-worker`/`stv-scheduler`; this crate only
//! resolves environment configuration, sets up logging, and binds the
//! HTTP listener each binary drives its loops behind.

pub mod env;
pub mod error;
pub mod logging;

pub use error::DaemonError;
