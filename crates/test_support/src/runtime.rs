use anyhow::{Result, bail};
use std::{
    env,
    os::unix::net::UnixStream,
    path::{Path, PathBuf},
    process::Command,
    sync::OnceLock,
    thread,
    time::{Duration, Instant},
};

const SOCKET_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Ensure a container runtime socket is available for testcontainers.
///
/// An explicit `DOCKER_HOST` wins. Otherwise the Docker socket is tried first,
/// then the usual Podman sockets, and `DOCKER_HOST` is pointed at whichever
/// one answers. The outcome is computed once per test binary.
///
/// # Errors
/// Returns an error if no Docker/Podman socket can be found or reached.
pub fn ensure_container_runtime() -> Result<()> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    match INIT.get_or_init(init_container_runtime) {
        Ok(()) => Ok(()),
        Err(message) => bail!("{message}"),
    }
}

fn init_container_runtime() -> Result<(), String> {
    if let Ok(docker_host) = env::var("DOCKER_HOST") {
        return validate_docker_host(&docker_host);
    }

    let docker_socket = Path::new(DOCKER_SOCKET);
    if wait_for_socket(docker_socket, SOCKET_WAIT_TIMEOUT) {
        return Ok(());
    }

    if let Some(path) = podman_socket_candidates()
        .into_iter()
        .find(|path| path.exists())
    {
        if wait_for_socket(&path, SOCKET_WAIT_TIMEOUT) {
            env::set_var("DOCKER_HOST", format!("unix://{}", path.display()));
            return Ok(());
        }
        let mut message = format!(
            "Podman socket found at `{}`, but it is not accepting connections.",
            path.display()
        );
        if let Some(err) = runtime_info_error("podman") {
            message.push_str(&format!(" podman info error: {err}."));
        }
        message.push_str(" Start `podman.socket` or run `podman system service`.");
        return Err(message);
    }

    let mut message = "No container runtime socket found or reachable. Start Docker or `podman.socket`, or set `DOCKER_HOST`.".to_string();
    if docker_socket.exists() {
        message.push_str(&format!(
            " Docker socket `{DOCKER_SOCKET}` exists but refused connections."
        ));
        if let Some(err) = runtime_info_error("docker") {
            message.push_str(&format!(" docker info error: {err}."));
        }
    }
    Err(message)
}

fn podman_socket_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(runtime_dir) = env::var("XDG_RUNTIME_DIR") {
        candidates.push(PathBuf::from(runtime_dir).join("podman/podman.sock"));
    }
    candidates.push(PathBuf::from("/var/run/podman/podman.sock"));
    candidates.push(PathBuf::from("/run/podman/podman.sock"));
    candidates
}

fn validate_docker_host(docker_host: &str) -> Result<(), String> {
    let socket = docker_host
        .strip_prefix("unix://")
        .or_else(|| docker_host.starts_with('/').then_some(docker_host));

    match socket {
        Some(path) if !wait_for_socket(Path::new(path), SOCKET_WAIT_TIMEOUT) => Err(format!(
            "`DOCKER_HOST` points to `{docker_host}`, but the socket is not accepting connections."
        )),
        // tcp:// and friends are handed to testcontainers as-is
        _ => Ok(()),
    }
}

fn wait_for_socket(path: &Path, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if path.exists() && UnixStream::connect(path).is_ok() {
            return true;
        }
        if !path.exists() {
            return false;
        }
        thread::sleep(Duration::from_millis(200));
    }
    false
}

/// Runs `<binary> info` and returns its stderr when it fails.
fn runtime_info_error(binary: &str) -> Option<String> {
    let output = match Command::new(binary).arg("info").output() {
        Ok(output) => output,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => return Some(err.to_string()),
    };

    if output.status.success() {
        return None;
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        Some(format!("{binary} info exited with {}", output.status))
    } else {
        Some(stderr)
    }
}
