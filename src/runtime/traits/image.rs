// ABOUTME: Image operations trait for the Docker Engine.
// ABOUTME: Pull images by reference.

use crate::types::ImageRef;
use async_trait::async_trait;

#[async_trait]
pub trait ImageOps: Send + Sync {
    /// Pull an image, consuming the engine's progress stream.
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),
}
