//! Snapshot assembly.
//!
//! One [`Collector::collect`] call produces one immutable [`HostSnapshot`];
//! nothing is cached between calls, so every snapshot re-derives its values
//! from the current host and container filesystem state.

use crate::hostfs::HostPathResolver;
use crate::metrics::{self, CpuMetrics, DiskMetrics, MemoryMetrics, OsIdentity};
use crate::netaddr;
use crate::nsexec::HostCommandRunner;

/// The host's externally-meaningful IPv4 address, or the `unavailable`
/// sentinel. Never a loopback or container-bridge address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub address: String,
}

impl NetworkIdentity {
    pub fn unavailable() -> Self {
        Self {
            address: netaddr::UNAVAILABLE.to_owned(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.address != netaddr::UNAVAILABLE
    }
}

/// One complete host telemetry observation.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    pub memory: MemoryMetrics,
    pub cpu: CpuMetrics,
    pub disk: DiskMetrics,
    pub network: NetworkIdentity,
    pub os: OsIdentity,
    /// True when a genuine bind-mounted host root was visible; false means
    /// the values may describe the container rather than the host.
    pub host_mounted: bool,
}

/// Assembles snapshots from a path resolver and a namespace command runner.
///
/// Each metric is collected independently: a broken source degrades inside
/// its own collector and can never block the others.
pub struct Collector {
    paths: HostPathResolver,
    runner: Box<dyn HostCommandRunner + Send + Sync>,
}

impl Collector {
    pub fn new(
        paths: HostPathResolver,
        runner: Box<dyn HostCommandRunner + Send + Sync>,
    ) -> Self {
        Self { paths, runner }
    }

    /// Computes a fresh snapshot. Synchronous; the only bounded blocking is
    /// file reads and time-limited subprocess calls inside the collectors.
    pub fn collect(&self) -> HostSnapshot {
        let host_mounted = self.paths.host_mounted();
        if !host_mounted {
            log::debug!("host root not mounted, snapshot may carry container-local values");
        }

        HostSnapshot {
            memory: metrics::memory::collect(&self.paths),
            cpu: metrics::cpu::collect(&self.paths),
            disk: metrics::disk::collect(&self.paths, self.runner.as_ref()),
            network: NetworkIdentity {
                address: netaddr::resolve_host_address(&self.paths, self.runner.as_ref()),
            },
            os: metrics::os::collect(&self.paths),
            host_mounted,
        }
    }
}
