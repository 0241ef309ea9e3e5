// ABOUTME: Validated domain types shared by both target kinds.
// ABOUTME: Target names, image references, and phantom-typed engine IDs.

mod id;
mod image_ref;
mod target_name;

pub use id::ContainerId;
pub use image_ref::{ImageRef, ParseImageRefError};
pub use target_name::{TargetName, TargetNameError};
