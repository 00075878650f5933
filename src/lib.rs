use std::path::PathBuf;
use std::sync::Arc;

use environment::RuntimeEnvironment;
use hostfs::HostPathResolver;
use snapshot::Collector;

/// Hostpeek: live host resource telemetry (CPU, memory, disk, network
/// identity, OS identity) reported from inside a container with only
/// partial, optionally-absent visibility into the host.
///
/// This library houses the extraction engine: a layered cascade over host
/// metric sources (process-1 root escape, bind-mounted host root, the
/// container's own pseudo-files) with namespace-entered commands where file
/// reads cannot answer, plus the IP-inference strategies built on top.
pub mod api;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod hostfs;
pub mod metrics;
pub mod netaddr;
pub mod nsexec;
pub mod snapshot;

// Deployment notes:
//  full host visibility needs "--pid=host --privileged" (enables the
//  /proc/1/root escape and nsenter), or a read-only bind mount of / at
//  /rootfs (ROOTFS_MOUNT_PATH)
//  with neither, every snapshot degrades to container-local values and
//  hostMounted=false

/// Runs the hostpeek service.
///
/// Detects the runtime environment, wires the host-path resolver and
/// namespace runner into a [`Collector`], and serves `GET /host`.
///
/// # Errors
///
/// Returns an error only if the listen address cannot be parsed from the
/// environment; missing host visibility is logged, never fatal.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let host_root = std::env::var_os("ROOTFS_MOUNT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(hostfs::DEFAULT_HOST_ROOT));
    let listen_addr =
        std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());

    let runtime_env = environment::detect_runtime_environment(&host_root);
    let resolver = HostPathResolver::new(hostfs::DEFAULT_ESCAPE_ROOT, &host_root);
    if matches!(runtime_env, RuntimeEnvironment::Container) && !resolver.host_mounted() {
        log::warn!(
            "running in a container without a host root mount at `{}`; \
             snapshots will report container-local values",
            host_root.display()
        );
    }
    log::debug!("host root: {}", host_root.display());

    let collector = Arc::new(Collector::new(
        resolver,
        Box::new(nsexec::NsenterRunner::default()),
    ));

    log::info!("serving host telemetry on {listen_addr}");
    api::APIServer::new(collector).listen(listen_addr).await;
    Ok(())
}
