//! Wire representation of the snapshot, decoupled from the domain types so
//! field naming can stay stable for dashboard consumers.

use crate::metrics::{CpuMetrics, DiskMetrics, MemoryMetrics, OsIdentity};
use crate::snapshot;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    pub memory: Memory,
    pub cpu: Cpu,
    pub disk: Disk,
    pub network: Network,
    pub os: Os,
    pub host_mounted: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct Memory {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    pub used: u64,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cpu {
    pub model: String,
    pub count: usize,
    pub usage_percent: f64,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage_percent: f64,
}

#[derive(Debug, serde::Serialize)]
pub struct Network {
    pub address: String,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Os {
    #[serde(rename = "type")]
    pub kind: String,
    pub release: String,
    pub hostname: String,
}

impl From<snapshot::HostSnapshot> for HostSnapshot {
    fn from(value: snapshot::HostSnapshot) -> Self {
        Self {
            memory: value.memory.into(),
            cpu: value.cpu.into(),
            disk: value.disk.into(),
            network: Network {
                address: value.network.address,
            },
            os: value.os.into(),
            host_mounted: value.host_mounted,
        }
    }
}

impl From<MemoryMetrics> for Memory {
    fn from(value: MemoryMetrics) -> Self {
        Self {
            total: value.total,
            free: value.free,
            available: value.available,
            used: value.used,
        }
    }
}

impl From<CpuMetrics> for Cpu {
    fn from(value: CpuMetrics) -> Self {
        Self {
            model: value.model,
            count: value.count,
            usage_percent: value.usage_percent,
        }
    }
}

impl From<DiskMetrics> for Disk {
    fn from(value: DiskMetrics) -> Self {
        Self {
            total: value.total,
            used: value.used,
            free: value.free,
            usage_percent: value.usage_percent,
        }
    }
}

impl From<OsIdentity> for Os {
    fn from(value: OsIdentity) -> Self {
        Self {
            kind: value.kind,
            release: value.release,
            hostname: value.hostname,
        }
    }
}
