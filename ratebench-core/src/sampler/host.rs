use std::sync::Arc;

use sysinfo::{Networks, Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::error::{Error, Result};

/// Cumulative and instantaneous host counters read once per sampler tick.
///
/// Each reading may fail on its own; the sampler drops the tick when any of them does.
pub trait HostMetrics: Send {
    /// Called once at the start of every tick, before the readings.
    fn refresh(&mut self) {}

    /// Total bytes received on all interfaces since boot.
    fn rx_bytes(&mut self) -> Result<u64>;

    /// CPU usage of this process, in percent of one core.
    fn cpu_percent(&mut self) -> Result<f64>;

    /// Resident memory of this process, in MiB.
    fn memory_mb(&mut self) -> Result<f64>;
}

/// Builds a fresh host reader for every sampler run.
pub type HostFactory = Arc<dyn Fn() -> Result<Box<dyn HostMetrics>> + Send + Sync>;

pub fn sysinfo_factory() -> HostFactory {
    Arc::new(|| -> Result<Box<dyn HostMetrics>> { Ok(Box::new(SysinfoHost::new()?)) })
}

fn process_refresh() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing().with_cpu().with_memory()
}

pub struct SysinfoHost {
    networks: Networks,
    system: System,
    pid: Pid,
}

impl SysinfoHost {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid().map_err(|reason| Error::HostMetric {
            metric: "pid",
            reason: reason.to_string(),
        })?;

        let mut system = System::new_with_specifics(
            RefreshKind::nothing().with_processes(process_refresh()),
        );
        // Primes the CPU baseline so the first tick reports a real delta.
        system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, process_refresh());

        Ok(Self {
            networks: Networks::new_with_refreshed_list(),
            system,
            pid,
        })
    }
}

impl HostMetrics for SysinfoHost {
    fn refresh(&mut self) {
        self.networks.refresh(true);
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::Some(&[self.pid]), true, process_refresh());
    }

    fn rx_bytes(&mut self) -> Result<u64> {
        if self.networks.list().is_empty() {
            return Err(Error::HostMetric {
                metric: "rx_bytes",
                reason: "no network interfaces".to_string(),
            });
        }

        Ok(self
            .networks
            .list()
            .values()
            .map(|data| data.total_received())
            .sum())
    }

    fn cpu_percent(&mut self) -> Result<f64> {
        self.system
            .process(self.pid)
            .map(|p| f64::from(p.cpu_usage()))
            .ok_or_else(|| Error::HostMetric {
                metric: "cpu_percent",
                reason: format!("process {} not found", self.pid),
            })
    }

    fn memory_mb(&mut self) -> Result<f64> {
        self.system
            .process(self.pid)
            .map(|p| p.memory() as f64 / 1024.0 / 1024.0)
            .ok_or_else(|| Error::HostMetric {
                metric: "memory_mb",
                reason: format!("process {} not found", self.pid),
            })
    }
}
