// ABOUTME: Local Docker Engine endpoint detection.
// ABOUTME: Honors DOCKER_HOST, then checks the Docker socket, then Podman sockets.

use super::types::{Endpoint, RuntimeInfo, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (DOCKER_HOST unset, no Docker or Podman socket)")]
    NoRuntimeFound,
}

const DOCKER_SOCKET: &str = "/var/run/docker.sock";
const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";

/// Find the engine to talk to on this machine.
///
/// Detection order:
/// 1. `DOCKER_HOST` environment variable
/// 2. Docker socket (`/var/run/docker.sock`)
/// 3. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 4. Rootful Podman socket (`/run/podman/podman.sock`)
pub fn detect_local() -> Result<RuntimeInfo, DetectionError> {
    if let Ok(host) = std::env::var("DOCKER_HOST")
        && !host.is_empty()
    {
        let runtime_type = if host.contains("podman") {
            RuntimeType::Podman
        } else {
            RuntimeType::Docker
        };
        return Ok(RuntimeInfo {
            runtime_type,
            endpoint: Endpoint::Env(host),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(socket(RuntimeType::Docker, DOCKER_SOCKET.to_string()));
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{uid}/podman/podman.sock");
        if Path::new(&rootless_socket).exists() {
            return Ok(socket(RuntimeType::Podman, rootless_socket));
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(socket(RuntimeType::Podman, ROOTFUL_PODMAN.to_string()));
    }

    Err(DetectionError::NoRuntimeFound)
}

fn socket(runtime_type: RuntimeType, path: String) -> RuntimeInfo {
    RuntimeInfo {
        runtime_type,
        endpoint: Endpoint::Socket(path),
    }
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docker_host_takes_precedence() {
        temp_env::with_var("DOCKER_HOST", Some("tcp://10.0.0.5:2376"), || {
            let info = detect_local().unwrap();
            assert_eq!(info.runtime_type, RuntimeType::Docker);
            assert_eq!(info.endpoint, Endpoint::Env("tcp://10.0.0.5:2376".to_string()));
        });
    }

    #[test]
    fn podman_docker_host_is_recognised() {
        temp_env::with_var(
            "DOCKER_HOST",
            Some("unix:///run/user/1000/podman/podman.sock"),
            || {
                let info = detect_local().unwrap();
                assert_eq!(info.runtime_type, RuntimeType::Podman);
            },
        );
    }
}
