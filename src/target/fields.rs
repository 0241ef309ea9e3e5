// ABOUTME: Build-file fields shared by every target type.
// ABOUTME: Flattened into each type's config so blocks read as one flat mapping.

use crate::config::deserialize::deserialize_string_map;
use crate::types::TargetName;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct BaseFields {
    /// Name for the target.
    pub name: TargetName,

    /// Target description.
    #[serde(default, rename = "desc")]
    pub description: Option<String>,

    /// Labels to apply to the target.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Build dependencies.
    #[serde(default)]
    pub deps: Vec<String>,

    /// OS environment variables passed through; part of the target hash.
    #[serde(default)]
    pub pass_env: Vec<String>,

    /// OS environment variables passed through; not hashed.
    #[serde(default)]
    pub secret_env: Vec<String>,

    /// Static environment variables.
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub visibility: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployFields {
    /// Dependencies of the deploy script.
    #[serde(default)]
    pub deploy_deps: Vec<String>,
}
