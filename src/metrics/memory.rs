//! Memory totals from `/proc/meminfo`-format text.

use crate::hostfs::HostPathResolver;

use super::local;

/// Host memory totals in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryMetrics {
    pub total: u64,
    pub free: u64,
    pub available: u64,
    /// Always `total - available`, saturating at zero.
    pub used: u64,
}

impl MemoryMetrics {
    pub fn from_totals(total: u64, free: u64, available: u64) -> Self {
        let available = available.min(total);
        Self {
            total,
            free: free.min(total),
            available,
            used: total.saturating_sub(available),
        }
    }
}

/// Extracts one kibibyte-valued field from meminfo-format text and converts
/// it to bytes. Lines look like `MemTotal:       16288916 kB`.
pub fn parse_meminfo_field(meminfo: &str, key: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?;
        let rest = rest.trim_start_matches([' ', '\t']).strip_prefix(':')?;
        let kib: u64 = rest.split_whitespace().next()?.parse().ok()?;
        Some(kib * 1024)
    })
}

/// Collects [`MemoryMetrics`] through the host-path cascade; each missing
/// field individually falls back to the container-local totals.
pub fn collect(paths: &HostPathResolver) -> MemoryMetrics {
    let meminfo = paths.read("/proc/meminfo");
    let field = |key: &str| meminfo.as_deref().and_then(|text| parse_meminfo_field(text, key));

    let (total, free, available) = match (
        field("MemTotal"),
        field("MemFree"),
        field("MemAvailable"),
    ) {
        (Some(total), Some(free), Some(available)) => (total, free, available),
        (total, free, available) => {
            let (local_total, local_free, local_available) = local::memory();
            (
                total.unwrap_or(local_total),
                free.unwrap_or(local_free),
                available.unwrap_or(local_available),
            )
        }
    };

    MemoryMetrics::from_totals(total, free, available)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:       16288916 kB
MemFree:          817848 kB
MemAvailable:    9983300 kB
Buffers:          517172 kB
";

    #[test]
    fn test_parse_fields_in_bytes() {
        assert_eq!(
            parse_meminfo_field(MEMINFO, "MemTotal"),
            Some(16_288_916 * 1024)
        );
        assert_eq!(parse_meminfo_field(MEMINFO, "MemFree"), Some(817_848 * 1024));
        assert_eq!(
            parse_meminfo_field(MEMINFO, "MemAvailable"),
            Some(9_983_300 * 1024)
        );
    }

    #[test]
    fn test_parse_missing_field() {
        assert_eq!(parse_meminfo_field(MEMINFO, "SwapTotal"), None);
    }

    #[test]
    fn test_key_must_match_exactly() {
        let meminfo = "MemTotalish: 42 kB\n";
        assert_eq!(parse_meminfo_field(meminfo, "MemTotal"), None);
    }

    #[test]
    fn test_used_is_total_minus_available() {
        let metrics = MemoryMetrics::from_totals(1000, 100, 250);
        assert_eq!(metrics.used, 750);
        assert_eq!(metrics.used, metrics.total - metrics.available);
    }

    #[test]
    fn test_available_clamped_to_total() {
        let metrics = MemoryMetrics::from_totals(1000, 100, 2000);
        assert_eq!(metrics.available, 1000);
        assert_eq!(metrics.used, 0);
    }

    #[test]
    fn test_collect_from_synthetic_meminfo() {
        let escape = tempfile::TempDir::new().unwrap();
        let container = tempfile::TempDir::new().unwrap();
        let proc = escape.path().join("proc");
        std::fs::create_dir_all(&proc).unwrap();
        std::fs::write(proc.join("meminfo"), MEMINFO).unwrap();
        let paths = HostPathResolver::with_container_root(
            escape.path(),
            "/nonexistent-host-root",
            container.path(),
        );

        let metrics = collect(&paths);
        assert_eq!(metrics.total, 16_288_916 * 1024);
        assert_eq!(metrics.used, metrics.total - metrics.available);
    }

    #[test]
    fn test_collect_without_host_sources_uses_local_totals() {
        let escape = tempfile::TempDir::new().unwrap();
        let container = tempfile::TempDir::new().unwrap();
        let paths = HostPathResolver::with_container_root(
            escape.path(),
            "/nonexistent-host-root",
            container.path(),
        );

        let metrics = collect(&paths);
        assert!(metrics.total > 0);
        assert!(metrics.available <= metrics.total);
        assert_eq!(metrics.used, metrics.total - metrics.available);
    }
}
