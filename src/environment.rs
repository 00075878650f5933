//! Runtime environment detection.
//!
//! Determines at startup whether the process runs inside a container. The
//! answer only drives operator-facing log output: a containerized deployment
//! without any host visibility still works, but every snapshot will carry
//! `host_mounted = false` and container-local values.

use std::path::{Path, PathBuf};
use std::{env, fs};

/// Available runtime environments.
#[derive(Debug, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running directly on the host.
    Host,
    /// Running inside a containerized environment (e.g. Docker, Kubernetes).
    Container,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read symlink `{path}`: {source}")]
    ReadSymlink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Returns true if this process does not share a pid namespace with the
/// init process visible under `rootfs`. The kernel exposes each namespace as
/// an identity symlink (`pid:[402653184]`); differing link targets mean
/// isolation.
///
/// # Errors
///
/// Returns [`Error::ReadSymlink`] if either namespace link cannot be read
/// (typically because `/proc` is restricted).
pub fn is_pid_namespace_isolated(rootfs: impl AsRef<Path>) -> Result<bool> {
    let own = namespace_identity(Path::new("/proc/self/ns/pid"))?;
    let init = namespace_identity(&rootfs.as_ref().join("proc/1/ns/pid"))?;
    Ok(own != init)
}

fn namespace_identity(link: &Path) -> Result<PathBuf> {
    fs::read_link(link).map_err(|source| Error::ReadSymlink {
        path: link.to_path_buf(),
        source,
    })
}

/// Returns true if `/proc/self/cgroup` names a container runtime or carries
/// a hex container ID segment.
///
/// # Errors
///
/// Returns [`Error::ReadFile`] if the cgroup file cannot be read.
pub fn matches_container_cgroup() -> Result<bool> {
    let path = Path::new("/proc/self/cgroup");
    let content = fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cgroup_content_is_containerized(&content))
}

fn cgroup_content_is_containerized(content: &str) -> bool {
    content.lines().any(|line| {
        line.contains("docker")
            || line.contains("kubepods")
            || line.contains("containerd")
            || line.contains("libpod")
            || line
                .split('/')
                .any(|part| part.len() >= 32 && part.chars().all(|c| c.is_ascii_hexdigit()))
    })
}

/// Returns true if known container marker files or variables exist.
pub fn has_container_indicators() -> bool {
    fs::metadata("/.dockerenv").is_ok()
        || fs::metadata("/run/.containerenv").is_ok()
        || env::var("container").is_ok()
}

/// Detects whether this process runs in a container or on the host.
///
/// Heuristics in order: pid-namespace comparison against the host rootfs,
/// cgroup content, container marker files. Individual check failures are
/// logged and skipped; detection itself never fails.
pub fn detect_runtime_environment(rootfs: impl AsRef<Path>) -> RuntimeEnvironment {
    match is_pid_namespace_isolated(rootfs) {
        Ok(true) => return RuntimeEnvironment::Container,
        Ok(false) => {}
        Err(err) => log::debug!("pid namespace check skipped: {err}"),
    }

    match matches_container_cgroup() {
        Ok(true) => return RuntimeEnvironment::Container,
        Ok(false) => {}
        Err(err) => log::debug!("cgroup analysis skipped: {err}"),
    }

    if has_container_indicators() {
        return RuntimeEnvironment::Container;
    }

    RuntimeEnvironment::Host
}
