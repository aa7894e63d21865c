// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;
use stv_core::{Node, NodeRole};

/// `host:port` the Manager's HTTP server binds to.
pub fn manager_addr() -> String {
    std::env::var("STV_MANAGER_ADDR").unwrap_or_else(|_| "0.0.0.0:7000".to_string())
}

/// `host:port` a Worker's HTTP server binds to.
pub fn worker_addr() -> String {
    std::env::var("STV_WORKER_ADDR").unwrap_or_else(|_| "0.0.0.0:7100".to_string())
}

/// Static fleet roster the Manager registers at startup, since there is
/// no service discovery in scope. Format: comma-separated
/// `name=host:port` pairs, e.g. `STV_WORKERS=w1=10.0.0.1:7100,w2=10.0.0.2:7100`.
/// An entry that doesn't parse is logged and skipped rather than
/// failing the whole list.
pub fn workers() -> Vec<Node> {
    let Ok(raw) = std::env::var("STV_WORKERS") else { return Vec::new() };
    let cores = worker_cores();
    let memory_bytes = worker_memory_bytes();
    let disk_bytes = worker_disk_bytes();
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|entry| {
            let (name, addr) = entry.trim().split_once('=')?;
            Some(Node {
                name: name.to_string(),
                addr: addr.to_string(),
                cores_total: cores,
                cores_allocated: 0.0,
                memory_total_bytes: memory_bytes,
                memory_allocated_bytes: 0,
                disk_total_bytes: disk_bytes,
                disk_allocated_bytes: 0,
                stats: None,
                role: NodeRole::Worker,
                task_count: 0,
            })
        })
        .collect()
}

/// Declared CPU cores every `STV_WORKERS` entry is assumed to have,
/// since the Manager has no capacity-discovery channel of its own.
pub fn worker_cores() -> f64 {
    std::env::var("STV_WORKER_CORES").ok().and_then(|s| s.parse().ok()).unwrap_or(4.0)
}

pub fn worker_memory_bytes() -> u64 {
    std::env::var("STV_WORKER_MEMORY_BYTES").ok().and_then(|s| s.parse().ok()).unwrap_or(8_000_000_000)
}

pub fn worker_disk_bytes() -> u64 {
    std::env::var("STV_WORKER_DISK_BYTES").ok().and_then(|s| s.parse().ok()).unwrap_or(50_000_000_000)
}

/// Which `SchedulerPolicy` the Manager runs: `round_robin` (default) or `epvm`.
pub fn scheduler_name() -> String {
    std::env::var("STV_SCHEDULER").unwrap_or_else(|_| "round_robin".to_string())
}

/// Backstop sweep interval over the Manager's admission queue (default 5s).
pub fn dispatch_tick() -> Duration {
    std::env::var("STV_DISPATCH_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Reconciliation loop interval (default 12s).
pub fn reconcile_tick() -> Duration {
    std::env::var("STV_RECONCILE_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(12))
}

/// Health-check loop interval (default 18s).
pub fn health_tick() -> Duration {
    std::env::var("STV_HEALTH_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(18))
}

/// Worker task-runner loop interval (default 8s).
pub fn worker_run_tick() -> Duration {
    std::env::var("STV_WORKER_RUN_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(8))
}

/// Worker container-state reconciliation interval (default 12s).
pub fn worker_update_tick() -> Duration {
    std::env::var("STV_WORKER_UPDATE_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(12))
}

/// Metrics publisher period (default 10s).
pub fn worker_stats_period() -> Duration {
    std::env::var("STV_WORKER_STATS_PERIOD_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Depth of the bounded metrics queue (default 5).
pub fn worker_stats_buffer() -> usize {
    std::env::var("STV_WORKER_STATS_BUFFER").ok().and_then(|s| s.parse().ok()).unwrap_or(5)
}

/// Bound on concurrent in-flight Docker Engine API requests.
pub fn docker_max_concurrent() -> usize {
    std::env::var("STV_DOCKER_MAX_CONCURRENT").ok().and_then(|s| s.parse().ok()).unwrap_or(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize the tests that
    // touch them so they don't trample each other under `cargo test`'s
    // default multi-threaded runner.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("STV_MANAGER_ADDR");
        assert_eq!(manager_addr(), "0.0.0.0:7000");
        std::env::remove_var("STV_RECONCILE_TICK_MS");
        assert_eq!(reconcile_tick(), Duration::from_secs(12));
    }

    #[test]
    fn parses_worker_list() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("STV_WORKERS", "w1=10.0.0.1:7100,w2=10.0.0.2:7100");
        let nodes = workers();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name, "w1");
        assert_eq!(nodes[0].addr, "10.0.0.1:7100");
        std::env::remove_var("STV_WORKERS");
    }

    #[test]
    fn skips_malformed_worker_entries() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("STV_WORKERS", "w1=10.0.0.1:7100,garbage,");
        let nodes = workers();
        assert_eq!(nodes.len(), 1);
        std::env::remove_var("STV_WORKERS");
    }

    #[test]
    fn missing_workers_var_yields_empty_list() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("STV_WORKERS");
        assert!(workers().is_empty());
    }
}
