//! Container-local introspection via `sysinfo`.
//!
//! These are the synthesizers of last resort: when no host-access mechanism
//! works at all, every metric still gets a value from the container's own
//! view, and the snapshot's `host_mounted` flag tells the caller it is
//! looking at container-local numbers.

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

/// Logical core count visible to this process, always at least 1.
pub fn cpu_count() -> usize {
    let system = System::new_with_specifics(
        RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()),
    );
    system.cpus().len().max(1)
}

/// Global CPU usage percentage sampled over the minimum interval `sysinfo`
/// supports. Blocks for roughly 200 ms; only reached when every host tick
/// source is unreadable.
pub fn cpu_usage_percent() -> f64 {
    let mut system = System::new_with_specifics(
        RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
    );
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_usage();
    f64::from(system.global_cpu_usage()).clamp(0.0, 100.0)
}

/// Memory totals in bytes: `(total, free, available)`.
pub fn memory() -> (u64, u64, u64) {
    let system = System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
    );
    (
        system.total_memory(),
        system.free_memory(),
        system.available_memory(),
    )
}

/// The container's own hostname.
pub fn hostname() -> Option<String> {
    System::host_name().filter(|name| !name.trim().is_empty())
}

/// OS name as reported by the container image, e.g. `Ubuntu`.
pub fn os_name() -> Option<String> {
    System::name().filter(|name| !name.trim().is_empty())
}

/// OS release as reported by the container image.
pub fn os_release() -> Option<String> {
    System::os_version()
        .or_else(System::kernel_version)
        .filter(|release| !release.trim().is_empty())
}
