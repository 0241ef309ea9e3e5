// ABOUTME: Docker Engine access for container targets.
// ABOUTME: Capability traits, the bollard implementation, and local endpoint detection.

mod bollard;
mod detection;
mod error;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local};
pub use error::RuntimeError;
pub use traits::*;
pub use types::{Endpoint, RuntimeInfo, RuntimeType};
