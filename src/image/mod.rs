// ABOUTME: The docker_image target type.
// ABOUTME: Builds an image tarball with buildx, pushes and tags it with crane, loads it locally.

mod scripts;

pub use scripts::{build_command, image_refs, load_command, load_ref, push_commands};

use crate::config::deserialize::{deserialize_string_map, deserialize_tags};
use crate::registry::TargetCreator;
use crate::target::{BaseFields, DeployFields, Target, TargetConfigContext, TargetError, TargetScript};
use nonempty::NonEmpty;
use scripts::{BuildImage, LoadImage, PushImage};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// File name of the image tarball written next to the build file.
pub const IMAGE_TARBALL: &str = "image.tar";

#[derive(Debug, Clone, Deserialize)]
pub struct DockerImageConfig {
    #[serde(flatten)]
    pub base: BaseFields,

    #[serde(flatten)]
    pub deploy: DeployFields,

    /// Files making up the build context.
    #[serde(default)]
    pub srcs: Vec<String>,

    /// `--build-arg` values, interpolated against the target env.
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub build_args: BTreeMap<String, String>,

    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,

    #[serde(default)]
    pub dockerignore: Option<String>,

    /// Repository name, without registry or tag.
    pub image: String,

    /// Build context directory, relative to the target's cwd.
    #[serde(default)]
    pub context: Option<String>,

    /// Registry to push to; falls back to `DOCKER_REGISTRY` from the target env.
    #[serde(default)]
    pub registry: Option<String>,

    #[serde(default = "default_tags", deserialize_with = "deserialize_tags")]
    pub tags: NonEmpty<String>,

    /// Passed to buildx as `--platform` when set.
    #[serde(default)]
    pub platform: Option<String>,

    /// Also load the image into the local engine after building.
    #[serde(default)]
    pub daemon: bool,

    #[serde(default, rename = "buildx_toolchain")]
    pub buildx: Option<String>,

    #[serde(default, rename = "crane_toolchain")]
    pub crane: Option<String>,
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

fn default_tags() -> NonEmpty<String> {
    NonEmpty::new("latest".to_string())
}

impl DockerImageConfig {
    /// `image:first-tag`, used in status messages.
    pub fn display_name(&self) -> String {
        format!("{}:{}", self.image, self.tags.head)
    }
}

impl TargetCreator for DockerImageConfig {
    fn get_targets(&self, ctx: &TargetConfigContext) -> Result<Vec<Target>, TargetError> {
        let tools = BTreeMap::from([
            ("buildx".to_string(), ctx.toolchain("buildx", self.buildx.as_deref())?),
            ("crane".to_string(), ctx.toolchain("crane", self.crane.as_deref())?),
        ]);

        let mut srcs = BTreeMap::from([
            ("context".to_string(), self.srcs.clone()),
            ("dockerfile".to_string(), vec![self.dockerfile.clone()]),
        ]);
        if let Some(ref ignore) = self.dockerignore {
            srcs.insert("dockerignore".to_string(), vec![ignore.clone()]);
        }

        let config = Arc::new(self.clone());

        let target = Target::new(&self.base, &ctx.cwd)
            .with_srcs(srcs)
            .with_outs(vec![IMAGE_TARBALL.to_string()])
            .with_tools(tools)
            .with_script(
                "build",
                TargetScript::new(BuildImage::new(config.clone())).deps(self.base.deps.clone()),
            )
            .with_script(
                "deploy",
                TargetScript::new(PushImage::new(config.clone()))
                    .alias("push")
                    .deps(self.deploy.deploy_deps.clone()),
            )
            .with_script("load", TargetScript::new(LoadImage::new(config)));

        Ok(vec![target])
    }
}
