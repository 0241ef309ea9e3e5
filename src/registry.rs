// ABOUTME: Registry of build-file type names this crate provides.
// ABOUTME: Decodes a block's mapping into the matching config and expands it into targets.

use crate::container::DockerContainerConfig;
use crate::image::DockerImageConfig;
use crate::target::{Target, TargetConfigContext, TargetError};
use serde::de::DeserializeOwned;

/// A decoded build-file block that can expand itself into targets.
pub trait TargetCreator: std::fmt::Debug + Send + Sync {
    fn get_targets(&self, ctx: &TargetConfigContext) -> Result<Vec<Target>, TargetError>;
}

type Decoder = fn(serde_yaml::Value) -> Result<Box<dyn TargetCreator>, serde_yaml::Error>;

/// Type name to decoder, for every target type known here.
pub const KNOWN_TARGETS: [(&str, Decoder); 2] = [
    ("docker_container", decode_as::<DockerContainerConfig> as Decoder),
    ("docker_image", decode_as::<DockerImageConfig> as Decoder),
];

fn decode_as<T>(value: serde_yaml::Value) -> Result<Box<dyn TargetCreator>, serde_yaml::Error>
where
    T: DeserializeOwned + TargetCreator + 'static,
{
    Ok(Box::new(serde_yaml::from_value::<T>(value)?))
}

pub fn known_types() -> impl Iterator<Item = &'static str> {
    KNOWN_TARGETS.iter().map(|(name, _)| *name)
}

/// Decode the fields of a `kind` block (without its `type` key).
pub fn decode(kind: &str, value: serde_yaml::Value) -> Result<Box<dyn TargetCreator>, TargetError> {
    let (_, decoder) = KNOWN_TARGETS
        .iter()
        .find(|(name, _)| *name == kind)
        .ok_or_else(|| TargetError::UnknownTargetType(kind.to_string()))?;

    decoder(value).map_err(|source| TargetError::Decode {
        kind: kind.to_string(),
        source,
    })
}
