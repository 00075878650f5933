//! CPU identity, core count, and usage extraction.
//!
//! The identity and count parsers tolerate the format drift between x86 and
//! ARM kernels: separators vary between tabs, `:` and `=`, and ARM kernels
//! report `Hardware`/`Processor`/`CPU implementer` lines instead of
//! `model name`.

use crate::hostfs::HostPathResolver;

use super::local;

/// CPU identity and utilization for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuMetrics {
    /// Human-readable model string, informational only.
    pub model: String,
    /// Logical core count, always at least 1.
    pub count: usize,
    /// Aggregate CPU busy percentage in `[0, 100]`.
    ///
    /// This is a cumulative-since-boot ratio of kernel tick counters, not an
    /// instantaneous rate; a true recent-window utilization would need two
    /// samples separated by a delay, which this call intentionally avoids to
    /// stay synchronous and cheap. The load-average fallback produces
    /// materially different numbers on long-running hosts.
    pub usage_percent: f64,
}

const MODEL_KEYS: [&str; 4] = ["model name", "Hardware", "Processor", "CPU implementer"];
const UNKNOWN_MODEL: &str = "unknown";

/// Extracts the value following `key` on `line`. The separator is `:` or `=`
/// (optionally whitespace-padded) or a bare tab; a bare space is not enough,
/// so that e.g. `Processor` does not match `Processor count`.
fn value_after_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?;
    let tab_separated = rest.starts_with('\t');
    let trimmed = rest.trim_start_matches([' ', '\t']);
    let value = match trimmed.strip_prefix([':', '=']) {
        Some(after) => after.trim(),
        None if tab_separated => trimmed.trim_end(),
        None => return None,
    };
    if value.is_empty() { None } else { Some(value) }
}

/// Finds the CPU model string in CPU-identity text (`/proc/cpuinfo` format).
///
/// `model name` wins when present; the ARM-style keys are consulted in order
/// as fallbacks.
pub fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    MODEL_KEYS.into_iter().find_map(|key| {
        cpuinfo
            .lines()
            .find_map(|line| value_after_key(line.trim_start(), key))
            .map(str::to_owned)
    })
}

/// Counts processor entries in CPU-identity text.
///
/// An entry is a line of the form `processor : N`, `processor= N`, or
/// `processor N`. When no entries match, a `CPU(s):` summary line (lscpu
/// style) is consulted.
pub fn parse_cpu_count(cpuinfo: &str) -> Option<usize> {
    let entries = cpuinfo
        .lines()
        .map(str::trim_start)
        .filter(|line| is_processor_entry(line))
        .count();
    if entries > 0 {
        return Some(entries);
    }

    cpuinfo
        .lines()
        .find_map(|line| value_after_key(line.trim_start(), "CPU(s)"))
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|count| *count > 0)
}

fn is_processor_entry(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("processor") else {
        return false;
    };
    let rest = rest.trim_start_matches([' ', '\t']);
    match rest.chars().next() {
        Some(':') | Some('=') => true,
        Some(c) if c.is_ascii_digit() => rest.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Computes the aggregate busy percentage from a tick-counter snapshot
/// (`/proc/stat` format): `busy / (busy + idle + iowait) * 100` where
/// `busy = user + nice + system + irq + softirq + steal`.
pub fn parse_cpu_usage_percent(stat: &str) -> Option<f64> {
    let line = stat
        .lines()
        .find(|line| line.starts_with("cpu ") || line.starts_with("cpu\t"))?;
    let ticks: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|field| field.parse().ok())
        .collect();
    if ticks.len() < 4 {
        return None;
    }
    let tick = |idx: usize| ticks.get(idx).copied().unwrap_or(0);
    let (user, nice, system, idle) = (tick(0), tick(1), tick(2), tick(3));
    let (iowait, irq, softirq, steal) = (tick(4), tick(5), tick(6), tick(7));

    let busy = user + nice + system + irq + softirq + steal;
    let total = busy + idle + iowait;
    if total == 0 {
        return None;
    }
    Some((busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
}

/// Approximates CPU usage from a load-average line (`/proc/loadavg` format):
/// 1-minute load over `count` cores, capped at 100.
pub fn usage_from_load_average(loadavg: &str, count: usize) -> Option<f64> {
    let one_minute: f64 = loadavg.split_whitespace().next()?.parse().ok()?;
    if !one_minute.is_finite() || one_minute < 0.0 {
        return None;
    }
    Some((one_minute / count.max(1) as f64 * 100.0).clamp(0.0, 100.0))
}

/// Collects [`CpuMetrics`] through the host-path cascade, degrading to
/// container-local introspection per field.
pub fn collect(paths: &HostPathResolver) -> CpuMetrics {
    let cpuinfo = paths.read("/proc/cpuinfo");

    let model = cpuinfo
        .as_deref()
        .and_then(parse_cpu_model)
        .unwrap_or_else(|| UNKNOWN_MODEL.to_owned());

    let count = cpuinfo
        .as_deref()
        .and_then(parse_cpu_count)
        .unwrap_or_else(local::cpu_count)
        .max(1);

    let usage_percent = paths
        .read("/proc/stat")
        .as_deref()
        .and_then(parse_cpu_usage_percent)
        .or_else(|| {
            paths
                .read("/proc/loadavg")
                .as_deref()
                .and_then(|loadavg| usage_from_load_average(loadavg, count))
        })
        .unwrap_or_else(local::cpu_usage_percent);

    CpuMetrics {
        model,
        count,
        usage_percent,
    }
}
