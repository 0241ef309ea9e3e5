// ABOUTME: Build file parsing and discovery.
// ABOUTME: A build file declares toolchains and a list of typed target blocks.

pub mod deserialize;

use crate::error::{Error, Result};
use crate::registry;
use crate::target::{Target, TargetConfigContext, TargetError};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const BUILD_FILENAME: &str = "BUILD.yml";
pub const BUILD_FILENAME_ALT: &str = "BUILD.yaml";
pub const BUILD_FILENAME_DIR: &str = ".zen/build.yml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildFile {
    /// Toolchain name to binary path.
    #[serde(default)]
    pub toolchains: BTreeMap<String, String>,

    /// Target blocks; each carries a `type` key naming its target type.
    #[serde(default)]
    pub targets: Vec<serde_yaml::Mapping>,
}

impl BuildFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(BUILD_FILENAME),
            dir.join(BUILD_FILENAME_ALT),
            dir.join(BUILD_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading build file {}", path.display());
                return Self::load(path);
            }
        }

        Err(Error::BuildFileNotFound(dir.to_path_buf()))
    }

    /// Expand every block into targets rooted at `cwd`.
    pub fn targets(&self, cwd: &Path) -> Result<Vec<Target>> {
        let ctx = TargetConfigContext {
            cwd: cwd.to_path_buf(),
            known_toolchains: self.toolchains.clone(),
        };

        let mut seen = BTreeSet::new();
        let mut targets = Vec::new();

        for block in &self.targets {
            let mut fields = block.clone();
            let kind = match fields.remove("type") {
                Some(serde_yaml::Value::String(kind)) => kind,
                _ => return Err(TargetError::MissingType.into()),
            };

            let creator = registry::decode(&kind, serde_yaml::Value::Mapping(fields))?;
            for target in creator.get_targets(&ctx)? {
                if !seen.insert(target.name.clone()) {
                    return Err(Error::DuplicateTarget(target.name.to_string()));
                }
                targets.push(target);
            }
        }

        Ok(targets)
    }

    /// Expand the build file and return the target named `name`.
    pub fn target(&self, cwd: &Path, name: &str) -> Result<Target> {
        self.targets(cwd)?
            .into_iter()
            .find(|t| t.name.as_str() == name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))
    }
}
