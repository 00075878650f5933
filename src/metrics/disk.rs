//! Root filesystem usage.
//!
//! Primary source is a `statvfs` call against the best host view of `/`;
//! when that fails (e.g. the syscall is blocked by the runtime's seccomp
//! profile) the fallback shells out to `df` and parses its POSIX output.

use std::path::Path;

use crate::error::ResultOkLogExt;
use crate::hostfs::HostPathResolver;
use crate::nsexec::{self, HostCommandRunner};

/// Root filesystem usage in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiskMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    /// `used / total * 100`, clamped to `[0, 100]`; `0` when nothing could
    /// be measured.
    pub usage_percent: f64,
}

impl DiskMetrics {
    fn from_sizes(total: u64, free: u64) -> Self {
        let free = free.min(total);
        let used = total - free;
        let usage_percent = if total == 0 {
            0.0
        } else {
            (used as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            total,
            used,
            free,
            usage_percent,
        }
    }
}

/// Filesystem statistics for `path` via `statvfs`: total from `blocks ×
/// fragment size`, free from `available blocks × fragment size`.
fn statvfs_metrics(path: &Path) -> Option<DiskMetrics> {
    let stats = nix::sys::statvfs::statvfs(path).ok_trace()?;
    let fragment = stats.fragment_size() as u64;
    let total = stats.blocks() as u64 * fragment;
    let free = stats.blocks_available() as u64 * fragment;
    if total == 0 {
        return None;
    }
    Some(DiskMetrics::from_sizes(total, free))
}

/// Parses POSIX `df -P` output (1024-byte blocks): takes the data row for
/// `/`, or the first data row when no root mount is listed.
pub fn parse_df_output(output: &str) -> Option<DiskMetrics> {
    let rows: Vec<&str> = output.lines().skip(1).collect();
    let row = rows
        .iter()
        .find(|row| row.split_whitespace().last() == Some("/"))
        .or_else(|| rows.first())?;

    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }
    let blocks: u64 = fields[1].parse().ok()?;
    let available: u64 = fields[3].parse().ok()?;
    let total = blocks * 1024;
    if total == 0 {
        return None;
    }
    Some(DiskMetrics::from_sizes(total, available.min(blocks) * 1024))
}

/// Collects [`DiskMetrics`] for the host root: `statvfs` through the path
/// cascade, then `df` inside the host's namespaces, then `df` locally, then
/// all zeros.
pub fn collect(paths: &HostPathResolver, runner: &dyn HostCommandRunner) -> DiskMetrics {
    if let Some(metrics) = statvfs_metrics(&paths.locate("/")) {
        return metrics;
    }

    let df_output = runner.run("df -P /").or_else(|| {
        if !nsexec::disk_usage_utility_available() {
            return None;
        }
        nsexec::run_local("df", &["-P", "/"])
    });
    if let Some(metrics) = df_output.as_deref().and_then(parse_df_output) {
        return metrics;
    }

    log::warn!("no disk usage source available, reporting zeros");
    DiskMetrics::default()
}
