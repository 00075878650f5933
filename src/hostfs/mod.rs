//! Host filesystem access for a containerized process.
//!
//! Resolves logical absolute paths (e.g. `/proc/meminfo`) against the best
//! available view of the host: the process-1 root escape, a bind-mounted host
//! root, or the container's own filesystem.
mod resolver;

pub use resolver::{DEFAULT_ESCAPE_ROOT, DEFAULT_HOST_ROOT, HostPathResolver};
