//! Read-only command execution inside the host's namespaces.
//!
//! Used only where direct pseudo-file reads cannot answer a question
//! (primarily IP discovery). Requires a host-visible init process and the
//! `nsenter` utility; when either is missing every call degrades to `None`.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Narrow capability for running a shell command in the host's namespaces.
///
/// Tests substitute a deterministic fake; production uses [`NsenterRunner`].
pub trait HostCommandRunner {
    /// Runs `command` and returns its trimmed stdout, or `None` on any
    /// failure (missing tooling, timeout, non-zero exit, unreadable output).
    fn run(&self, command: &str) -> Option<String>;
}

/// Runner that enters the host's mount, UTS, and network namespaces via
/// `nsenter` targeting pid 1.
///
/// The IPC namespace is intentionally not entered; it requires broader
/// privilege than the read-only queries here need.
#[derive(Debug, Clone)]
pub struct NsenterRunner {
    init_ns: PathBuf,
    timeout: Duration,
}

const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

impl Default for NsenterRunner {
    fn default() -> Self {
        Self {
            init_ns: PathBuf::from("/proc/1/ns"),
            timeout: COMMAND_TIMEOUT,
        }
    }
}

impl NsenterRunner {
    #[cfg(test)]
    fn with_init_ns(init_ns: impl Into<PathBuf>) -> Self {
        Self {
            init_ns: init_ns.into(),
            timeout: COMMAND_TIMEOUT,
        }
    }

    /// Returns true if a host-visible init process handle and the `nsenter`
    /// utility are both available. Checked before every execution so that the
    /// caller-side cascade can skip namespace strategies cheaply.
    fn available(&self) -> bool {
        self.init_ns.exists() && resolve_on_path("nsenter").is_some()
    }
}

impl HostCommandRunner for NsenterRunner {
    fn run(&self, command: &str) -> Option<String> {
        if !self.available() {
            log::debug!("namespace entry unavailable, skipping `{command}`");
            return None;
        }

        // -t 1: target init; -m/-u/-n: mount, UTS, network namespaces.
        let mut cmd = Command::new("nsenter");
        cmd.args(["-t", "1", "-m", "-u", "-n", "--", "sh", "-c", command]);
        run_bounded(&mut cmd, command, self.timeout)
    }
}

/// Spawns `command` and returns its trimmed stdout, killing the child when
/// `timeout` elapses before it exits.
///
/// Stdout is drained on a dedicated thread while the child runs: a child
/// writing more than the OS pipe buffer would otherwise block on write, never
/// exit, and be killed at the deadline even though the command succeeded.
fn run_bounded(command: &mut Command, label: &str, timeout: Duration) -> Option<String> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| log::warn!("failed to spawn `{label}`: {err}"))
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let drain = std::thread::spawn(move || {
        let mut output = String::new();
        std::io::Read::read_to_string(&mut stdout, &mut output).map(|_| output)
    });

    let status = wait_bounded(&mut child, label, timeout)?;
    if !status.success() {
        log::debug!("command `{label}` exited with {status}");
        return None;
    }

    let output = drain.join().ok()?.ok()?;
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Waits for `child` until it exits or `timeout` elapses, killing it on
/// expiry.
fn wait_bounded(
    child: &mut std::process::Child,
    label: &str,
    timeout: Duration,
) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    log::warn!("command `{label}` timed out after {timeout:?}");
                    return None;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                log::warn!("failed to poll command `{label}`: {err}");
                return None;
            }
        }
    }
}

/// Resolves `binary` against the `PATH` search path.
fn resolve_on_path(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Returns true if `df` (the disk-usage fallback utility) resolves on `PATH`.
pub fn disk_usage_utility_available() -> bool {
    resolve_on_path("df").is_some()
}

/// Runs `command` directly in the container (no namespace entry), under the
/// same deadline and stdout draining as namespace-entered commands. Used for
/// fallbacks that are meaningful even without host visibility, e.g. `df`
/// against the container root, which can stall on a wedged network mount.
pub fn run_local(command: &str, args: &[&str]) -> Option<String> {
    let mut cmd = Command::new(command);
    cmd.args(args);
    run_bounded(&mut cmd, command, COMMAND_TIMEOUT)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::HostCommandRunner;
    use std::collections::HashMap;

    /// Deterministic fake: maps exact command strings to canned output.
    #[derive(Debug, Default)]
    pub struct FakeRunner {
        responses: HashMap<String, String>,
    }

    impl FakeRunner {
        pub fn with(mut self, command: &str, output: &str) -> Self {
            self.responses.insert(command.to_owned(), output.to_owned());
            self
        }
    }

    impl HostCommandRunner for FakeRunner {
        fn run(&self, command: &str) -> Option<String> {
            self.responses.get(command).cloned()
        }
    }

    /// Runner that always reports the host as unreachable.
    #[derive(Debug, Default)]
    pub struct UnavailableRunner;

    impl HostCommandRunner for UnavailableRunner {
        fn run(&self, _command: &str) -> Option<String> {
            None
        }
    }
}
