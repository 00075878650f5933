/// Entry point for the hostpeek telemetry service.
///
/// Serves one read-only route, `GET /host`, returning a JSON snapshot of the
/// machine hosting this container: CPU, memory, disk, network identity and
/// OS identity, extracted through whatever host visibility the container was
/// granted.
///
/// # Examples
///
/// ```bash
/// ROOTFS_MOUNT_PATH=/rootfs LISTEN_ADDR=0.0.0.0:3000 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    hostpeek::run().await
}
