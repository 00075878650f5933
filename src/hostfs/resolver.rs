use std::path::PathBuf;

use crate::fsutil;

/// Mount point of the host root filesystem through the init process, when pid
/// namespace isolation is relaxed for this container.
pub const DEFAULT_ESCAPE_ROOT: &str = "/proc/1/root";

/// Conventional mount point for a host root bind-mounted into the container.
pub const DEFAULT_HOST_ROOT: &str = "/rootfs";

/// Resolves logical absolute paths against the best available host view.
///
/// Three tiers are tried in priority order, first non-empty regular-file read
/// wins:
///
/// 1. `<escape_root><logical>` — the process-1 root escape.
/// 2. `<host_root><logical>` — a bind-mounted host root, only considered
///    valid if its `proc`, `sys`, and `etc` subdirectories all exist.
/// 3. `<container_root><logical>` — the container's own filesystem
///    (`container_root` is `/` in production).
///
/// Each tier is independently guarded; a failed or empty read falls through
/// to the next. All roots are injectable so tests can point the resolver at
/// synthetic directory trees.
#[derive(Debug, Clone)]
pub struct HostPathResolver {
    escape_root: PathBuf,
    host_root: PathBuf,
    container_root: PathBuf,
}

impl Default for HostPathResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ESCAPE_ROOT, DEFAULT_HOST_ROOT)
    }
}

impl HostPathResolver {
    pub fn new(escape_root: impl Into<PathBuf>, host_root: impl Into<PathBuf>) -> Self {
        Self::with_container_root(escape_root, host_root, "/")
    }

    pub fn with_container_root(
        escape_root: impl Into<PathBuf>,
        host_root: impl Into<PathBuf>,
        container_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            escape_root: escape_root.into(),
            host_root: host_root.into(),
            container_root: container_root.into(),
        }
    }

    /// Returns true if the bind-mounted host root looks genuine, i.e. its
    /// `proc`, `sys`, and `etc` subdirectories all exist. This is the
    /// caller-facing accuracy signal carried in the snapshot.
    pub fn host_mounted(&self) -> bool {
        ["proc", "sys", "etc"]
            .iter()
            .all(|sub| self.host_root.join(sub).exists())
    }

    /// Returns the first existing host-view prefix for `logical`, used by
    /// callers that need a concrete path (e.g. filesystem statistics) rather
    /// than file content. Falls back to the container's own path.
    pub fn locate(&self, logical: &str) -> PathBuf {
        let relative = logical.trim_start_matches('/');
        let escaped = self.escape_root.join(relative);
        if escaped.exists() {
            return escaped;
        }
        if self.host_mounted() {
            let mounted = self.host_root.join(relative);
            if mounted.exists() {
                return mounted;
            }
        }
        self.container_root.join(relative)
    }

    /// Reads `logical` through the cascade without a fallback producer.
    ///
    /// # Arguments
    ///
    /// * `logical` - An absolute path as it would appear on the host
    ///   (e.g. `/proc/cpuinfo`).
    ///
    /// # Returns
    ///
    /// * `Some(content)` (trimmed, non-empty) from the first tier that
    ///   yields a readable regular file.
    /// * `None` if all three tiers fail.
    pub fn read(&self, logical: &str) -> Option<String> {
        let relative = logical.trim_start_matches('/');

        if let Some(content) = fsutil::read_trimmed(self.escape_root.join(relative)) {
            log::debug!("resolved `{logical}` via process-1 root escape");
            return Some(content);
        }

        if self.host_mounted()
            && let Some(content) = fsutil::read_trimmed(self.host_root.join(relative))
        {
            log::debug!("resolved `{logical}` via bind-mounted host root");
            return Some(content);
        }

        if let Some(content) = fsutil::read_trimmed(self.container_root.join(relative)) {
            log::debug!("resolved `{logical}` via container filesystem");
            return Some(content);
        }

        log::debug!("no readable source for `{logical}`");
        None
    }

    /// Reads `logical` through the cascade, invoking `fallback` when every
    /// tier fails. The fallback result is returned unconditionally, so this
    /// never errors.
    pub fn resolve(&self, logical: &str, fallback: impl FnOnce() -> String) -> String {
        match self.read(logical) {
            Some(content) => content,
            None => {
                log::debug!("falling back to container-local synthesizer for `{logical}`");
                fallback()
            }
        }
    }
}
