//! OS identity: kernel release, distribution name, hostname.

use crate::hostfs::HostPathResolver;

use super::local;

/// Best-effort OS identity for the host; every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsIdentity {
    /// OS family, `Linux` whenever a kernel version file was readable.
    pub kind: String,
    /// Kernel release, or the distribution pretty-name when the kernel is a
    /// minimal VM kernel that says nothing useful about the host.
    pub release: String,
    pub hostname: String,
}

const UNKNOWN: &str = "unknown";

// Kernel builds whose version string describes the VM shim rather than the
// host distribution (Docker Desktop, WSL).
const MINIMAL_VM_SIGNATURES: [&str; 2] = ["linuxkit", "microsoft"];

/// Extracts the release token from a kernel version line
/// (`Linux version 6.5.0-44-generic (buildd@...) ...`).
pub fn parse_kernel_release(version: &str) -> Option<&str> {
    let rest = version.strip_prefix("Linux version ")?;
    let token = rest.split_whitespace().next()?;
    if token.is_empty() { None } else { Some(token) }
}

/// Returns true if the kernel release names a minimal VM kernel.
pub fn is_minimal_vm_kernel(release: &str) -> bool {
    let lower = release.to_lowercase();
    MINIMAL_VM_SIGNATURES
        .iter()
        .any(|signature| lower.contains(signature))
}

/// Extracts `PRETTY_NAME` from os-release-format text, stripping quotes.
pub fn parse_pretty_name(os_release: &str) -> Option<&str> {
    os_release.lines().find_map(|line| {
        let value = line.strip_prefix("PRETTY_NAME=")?;
        let value = value.trim().trim_matches('"');
        if value.is_empty() { None } else { Some(value) }
    })
}

/// Returns true if `name` is a container-generated hostname rather than the
/// host's: a 12-hex-character container ID or the literal placeholder
/// `host`.
pub fn is_container_hostname(name: &str) -> bool {
    if name == "host" {
        return true;
    }
    name.len() == 12 && name.chars().all(|c| c.is_ascii_hexdigit())
}

/// Collects [`OsIdentity`] through the host-path cascade.
///
/// Release prefers the kernel version token; a minimal-VM kernel defers to
/// the distribution `PRETTY_NAME`. Hostname tries the kernel-reported name,
/// then `/etc/hostname`, rejecting container-generated values, and finally
/// the container's own hostname.
pub fn collect(paths: &HostPathResolver) -> OsIdentity {
    let kernel_release = paths
        .read("/proc/version")
        .as_deref()
        .and_then(parse_kernel_release)
        .map(str::to_owned);

    let kind = if kernel_release.is_some() {
        "Linux".to_owned()
    } else {
        local::os_name().unwrap_or_else(|| UNKNOWN.to_owned())
    };

    let release = match kernel_release {
        Some(release) if is_minimal_vm_kernel(&release) => paths
            .read("/etc/os-release")
            .as_deref()
            .and_then(parse_pretty_name)
            .map(str::to_owned)
            .unwrap_or(release),
        Some(release) => release,
        None => local::os_release().unwrap_or_else(|| UNKNOWN.to_owned()),
    };

    let hostname = ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .into_iter()
        .find_map(|logical| {
            paths
                .read(logical)
                .filter(|name| !is_container_hostname(name))
        })
        .or_else(local::hostname)
        .unwrap_or_else(|| UNKNOWN.to_owned());

    OsIdentity {
        kind,
        release,
        hostname,
    }
}
