// ABOUTME: Container operations trait for the Docker Engine.
// ABOUTME: Existence check by name, create, start, and wait for exit.

use super::shared_types::ContainerSpec;
use crate::types::ContainerId;
use async_trait::async_trait;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Whether a container with this name exists, running or not.
    async fn container_exists(&self, name: &str) -> Result<bool, ContainerError>;

    /// Create a container from the given spec.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError>;

    /// Start a created container.
    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Block until the container stops and return its exit code.
    async fn wait_container(&self, id: &ContainerId) -> Result<i64, ContainerError>;
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container already exists: {0}")]
    AlreadyExists(String),

    #[error("container already running: {0}")]
    AlreadyRunning(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
