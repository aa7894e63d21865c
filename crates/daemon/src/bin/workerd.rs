// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for the Worker daemon: binds the Worker HTTP surface and
//! runs its task-runner, container-state, and metrics-publisher loops
//! alongside it.

use std::sync::Arc;
use stv_adapters::{DockerEngine, LinuxStatsProvider};
use stv_core::SystemClock;
use stv_daemon::{env, logging, DaemonError};
use stv_transport::Handler;
use stv_worker::Worker;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let engine = Arc::new(DockerEngine::new(env::docker_max_concurrent()));
    let stats = Arc::new(LinuxStatsProvider::new());
    let worker = Arc::new(Worker::new(engine, stats, SystemClock));

    tokio::spawn(Arc::clone(&worker).run_periodically(env::worker_run_tick()));
    tokio::spawn(Arc::clone(&worker).update_tasks_periodically(env::worker_update_tick()));

    let mut samples = Arc::clone(&worker).collect_stats(env::worker_stats_period(), env::worker_stats_buffer());
    tokio::spawn(async move {
        while let Some(sample) = samples.recv().await {
            tracing::debug!(?sample, "metrics sample published");
        }
    });

    let addr = env::worker_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| DaemonError::Bind { addr: addr.clone(), source })?;
    tracing::info!(%addr, "worker listening");

    let handler: Handler = Arc::new(move |req| {
        let worker = Arc::clone(&worker);
        Box::pin(async move { stv_worker::route(&worker, req).await })
    });

    let mut sigterm = signal(SignalKind::terminate()).map_err(DaemonError::Signal)?;
    tokio::select! {
        _ = stv_transport::serve_tcp(listener, handler) => {}
        _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c, shutting down"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
    }

    Ok(())
}
