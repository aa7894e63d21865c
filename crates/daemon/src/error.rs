// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup failures for the two binaries. Anything past startup (the
//! HTTP accept loop, the periodic loops) runs until a signal arrives and
//! has no failure path of its own to report here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, #[source] source: std::io::Error },

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
