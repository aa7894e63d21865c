// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host metrics snapshot shared between the Worker's stats boundary and
//! the Manager's EPVM scorer.

use serde::{Deserialize, Serialize};

/// CPU-time counters, in jiffies, as read from `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTime {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTime {
    /// `idle = idle + iowait`; `total = idle + user + nice + system + irq + softirq + steal`.
    pub fn idle_total(&self) -> (u64, u64) {
        let idle = self.idle.saturating_add(self.iowait);
        let busy = self
            .user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal);
        (idle, idle.saturating_add(busy))
    }

    /// Fractional CPU usage between two samples. Zero-delta resolves to
    /// `0.0` rather than dividing by zero.
    pub fn usage_between(prev: &CpuTime, cur: &CpuTime) -> f64 {
        let (prev_idle, prev_total) = prev.idle_total();
        let (cur_idle, cur_total) = cur.idle_total();
        let idle_delta = cur_idle.saturating_sub(prev_idle) as f64;
        let total_delta = cur_total.saturating_sub(prev_total) as f64;
        if total_delta == 0.0 {
            return 0.0;
        }
        (total_delta - idle_delta) / total_delta
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAvg {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemStats {
    pub total_kb: u64,
    pub used_kb: u64,
    pub free_kb: u64,
    pub available_kb: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskStats {
    pub total_kb: u64,
    pub used_kb: u64,
    pub free_kb: u64,
}

/// A full host-metrics snapshot, as exposed over `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub cpu: CpuTime,
    pub load: LoadAvg,
    pub memory: MemStats,
    pub disk: DiskStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_between_identical_samples_is_zero() {
        let a = CpuTime { user: 100, idle: 900, ..Default::default() };
        assert_eq!(CpuTime::usage_between(&a, &a), 0.0);
    }

    #[test]
    fn usage_between_computes_busy_fraction() {
        let prev = CpuTime { user: 100, idle: 900, ..Default::default() };
        let cur = CpuTime { user: 150, idle: 950, ..Default::default() };
        // delta user = 50, delta idle = 50, delta total = 100 -> usage 0.5
        assert_eq!(CpuTime::usage_between(&prev, &cur), 0.5);
    }

    #[test]
    fn iowait_counts_as_idle() {
        let prev = CpuTime { idle: 0, iowait: 0, ..Default::default() };
        let cur = CpuTime { idle: 0, iowait: 100, ..Default::default() };
        assert_eq!(CpuTime::usage_between(&prev, &cur), 0.0);
    }
}
