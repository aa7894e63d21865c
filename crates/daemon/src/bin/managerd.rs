// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for the Manager daemon: binds the Manager HTTP surface
//! and runs its periodic dispatch-drain, reconciliation, and health
//! loops alongside it.

use std::sync::Arc;
use stv_core::SystemClock;
use stv_daemon::{env, logging, DaemonError};
use stv_manager::{HttpCpuUsageSource, Manager};
use stv_scheduler::{Epvm, RoundRobin, SchedulerPolicy};
use stv_transport::Handler;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let scheduler: Box<dyn SchedulerPolicy> = match env::scheduler_name().as_str() {
        "epvm" => Box::new(Epvm::new(HttpCpuUsageSource::new())),
        other => {
            if other != "round_robin" {
                tracing::warn!(requested = other, "unknown STV_SCHEDULER value, defaulting to round_robin");
            }
            Box::new(RoundRobin::new())
        }
    };
    let manager = Arc::new(Manager::new(scheduler, SystemClock));

    for node in env::workers() {
        tracing::info!(worker = %node.name, addr = %node.addr, "registering worker");
        manager.register_worker(node.addr.clone(), node);
    }

    tokio::spawn(Arc::clone(&manager).update_tasks_periodically(env::reconcile_tick()));
    tokio::spawn(Arc::clone(&manager).do_health_checks_periodically(env::health_tick()));
    tokio::spawn(Arc::clone(&manager).drain_pending_periodically(env::dispatch_tick()));

    let addr = env::manager_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| DaemonError::Bind { addr: addr.clone(), source })?;
    tracing::info!(%addr, "manager listening");

    let handler: Handler = Arc::new(move |req| {
        let manager = Arc::clone(&manager);
        Box::pin(async move { stv_manager::route(&manager, req).await })
    });

    let mut sigterm = signal(SignalKind::terminate()).map_err(DaemonError::Signal)?;
    tokio::select! {
        _ = stv_transport::serve_tcp(listener, handler) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c, shutting down"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
    }

    Ok(())
}
