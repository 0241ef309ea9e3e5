// ABOUTME: Composable capability traits for the Docker Engine.
// ABOUTME: ImageOps pulls images; ContainerOps inspects, creates, starts and waits.

mod container;
mod image;
mod shared_types;

pub use container::{ContainerError, ContainerOps};
pub use image::{ImageError, ImageOps};
pub use shared_types::*;

/// Everything a container deploy needs from the engine.
pub trait Engine: ImageOps + ContainerOps {}

impl<T: ImageOps + ContainerOps> Engine for T {}
