// ABOUTME: Bollard-based Docker Engine implementation of the capability traits.
// ABOUTME: Works against Docker and Podman through the Docker-compatible API.

use super::error::{ConnectionSnafu, NegotiationSnafu, RuntimeError};
use super::traits::{ContainerError, ContainerOps, ContainerSpec, ImageError, ImageOps};
use super::types::{Endpoint, RuntimeInfo};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, StartContainerOptions,
    WaitContainerOptions,
};
use futures::StreamExt;
use snafu::ResultExt;
use std::collections::HashMap;

const CONNECT_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        _ => ImageError::PullFailed(format!("{image_name}: {e}")),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

// =============================================================================
// ContainerSpec Conversion
// =============================================================================

fn host_config(spec: &ContainerSpec) -> HostConfig {
    let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = spec
        .port_bindings
        .iter()
        .map(|(port, binding)| {
            (
                port.to_string(),
                Some(vec![PortBinding {
                    host_ip: Some(binding.host_ip.clone()),
                    host_port: Some(binding.host_port.map(|p| p.to_string()).unwrap_or_default()),
                }]),
            )
        })
        .collect();

    let mounts: Vec<Mount> = spec
        .mounts
        .iter()
        .map(|m| Mount {
            source: Some(m.source.clone()),
            target: Some(m.target.clone()),
            typ: Some(MountTypeEnum::BIND),
            ..Default::default()
        })
        .collect();

    HostConfig {
        port_bindings: Some(port_bindings),
        mounts: Some(mounts),
        memory: spec.resources.memory,
        nano_cpus: spec.resources.nano_cpus,
        ..Default::default()
    }
}

fn create_body(spec: &ContainerSpec) -> ContainerCreateBody {
    let exposed_ports: Vec<String> = spec.port_bindings.keys().map(|p| p.to_string()).collect();

    ContainerCreateBody {
        image: Some(spec.image.to_string()),
        env: Some(spec.env.clone()),
        cmd: spec.cmd.clone(),
        entrypoint: spec.entrypoint.clone(),
        exposed_ports: if exposed_ports.is_empty() {
            None
        } else {
            Some(exposed_ports)
        },
        host_config: Some(host_config(spec)),
        ..Default::default()
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Docker Engine client used by container targets.
pub struct BollardRuntime {
    client: Docker,
}

impl BollardRuntime {
    pub fn new(client: Docker) -> Self {
        Self { client }
    }

    /// Connect to the engine described by `info` and negotiate the API version.
    pub async fn connect(info: &RuntimeInfo) -> Result<Self, RuntimeError> {
        let endpoint = info.endpoint.to_string();
        let client = match &info.endpoint {
            Endpoint::Socket(path) => {
                Docker::connect_with_unix(path, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            Endpoint::Env(_) => Docker::connect_with_defaults(),
        }
        .context(ConnectionSnafu {
            endpoint: endpoint.clone(),
        })?;

        let client = client
            .negotiate_version()
            .await
            .context(NegotiationSnafu { endpoint })?;

        Ok(Self::new(client))
    }

    /// Detect the local engine and connect to it.
    pub async fn connect_local() -> Result<Self, RuntimeError> {
        let info = super::detect_local()?;
        tracing::debug!("using {} at {}", info.runtime_type, info.endpoint);
        Self::connect(&info).await
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| map_image_pull_error(e, &image_name))?;
            if let Some(status) = info.status {
                tracing::trace!(image = %image_name, "{status}");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn container_exists(&self, name: &str) -> Result<bool, ContainerError> {
        match self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ContainerError::Runtime(format!(
                "failed to inspect {name}: {e}"
            ))),
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let opts = CreateContainerOptions {
            name: Some(spec.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), create_body(spec))
            .await
            .map_err(map_container_create_error)?;

        for warning in &response.warnings {
            tracing::warn!(container = %spec.name, "{warning}");
        }

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64, ContainerError> {
        let opts = WaitContainerOptions {
            condition: "not-running".to_string(),
        };

        let mut stream = self.client.wait_container(id.as_str(), Some(opts));
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports non-zero exits as errors; callers want the code.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(map_container_not_found_error(e)),
            None => Err(ContainerError::Runtime(format!(
                "wait for {} ended without a status",
                id.short()
            ))),
        }
    }
}
