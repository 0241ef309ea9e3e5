// ABOUTME: Build, deploy and load scripts of docker_image targets.
// ABOUTME: Each script assembles buildx/crane command lines and runs them in the target cwd.

use super::{DockerImageConfig, IMAGE_TARBALL};
use crate::process::ToolCommand;
use crate::target::script::{
    BuildArgsSnafu, BuildSnafu, ImageReferenceSnafu, LoadSnafu, MissingRegistrySnafu,
    MissingToolSnafu, PushSnafu, TagSnafu,
};
use crate::target::{RuntimeContext, Script, ScriptError, Target, interpolate_map};
use crate::types::ImageRef;
use async_trait::async_trait;
use nonempty::NonEmpty;
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;

/// `buildx build` invocation writing the image tarball into the target cwd.
///
/// Flag order is fixed: `--output`, `--file`, the build args sorted by name,
/// then `--platform` when one is configured.
pub fn build_command(
    config: &DockerImageConfig,
    target: &Target,
) -> Result<ToolCommand, ScriptError> {
    let context = match config.context {
        Some(ref context) => target.cwd.join(context),
        None => target.cwd.clone(),
    };

    let dockerfile = target
        .srcs
        .get("dockerfile")
        .and_then(|files| files.first())
        .cloned()
        .unwrap_or_else(|| config.dockerfile.clone());

    let vars = target.env_vars();
    let build_args = interpolate_map(&config.build_args, &vars).context(BuildArgsSnafu)?;

    let mut cmd = ToolCommand::new(tool(target, "buildx")?)
        .arg("build")
        .arg(context.display().to_string())
        .arg("--output")
        .arg(format!(
            "type=docker,dest={}/{IMAGE_TARBALL}",
            target.cwd.display()
        ))
        .arg("--file")
        .arg(dockerfile);

    for (k, v) in build_args {
        cmd = cmd.arg("--build-arg").arg(format!("{k}={v}"));
    }

    if let Some(ref platform) = config.platform {
        cmd = cmd.arg("--platform").arg(platform.as_str());
    }

    Ok(cmd.current_dir(&target.cwd).envs(vars))
}

fn tool<'a>(target: &'a Target, name: &str) -> Result<&'a str, ScriptError> {
    target.tool(name).context(MissingToolSnafu { tool: name })
}

fn registry(config: &DockerImageConfig, target: &Target) -> Option<String> {
    config
        .registry
        .clone()
        .or_else(|| target.env_vars().get("DOCKER_REGISTRY").cloned())
}

/// Fully qualified references for every tag, in declaration order.
pub fn image_refs(
    config: &DockerImageConfig,
    target: &Target,
) -> Result<NonEmpty<ImageRef>, ScriptError> {
    let registry = registry(config, target).context(MissingRegistrySnafu)?;

    let reference = |tag: &String| ImageRef::in_registry(&registry, &config.image, tag);

    let head = reference(&config.tags.head).context(ImageReferenceSnafu)?;
    let tail = config
        .tags
        .tail
        .iter()
        .map(reference)
        .collect::<Result<Vec<_>, _>>()
        .context(ImageReferenceSnafu)?;

    Ok(NonEmpty { head, tail })
}

/// `crane push` of the tarball under the first reference, then one
/// `crane tag` per remaining reference.
pub fn push_commands(
    target: &Target,
    refs: &NonEmpty<ImageRef>,
) -> Result<Vec<ToolCommand>, ScriptError> {
    let tarball = target.cwd.join(IMAGE_TARBALL);
    let vars = target.env_vars();
    let crane = tool(target, "crane")?;

    let push = ToolCommand::new(crane)
        .arg("push")
        .arg(tarball.display().to_string())
        .arg(refs.head.to_string())
        .current_dir(&target.cwd)
        .envs(vars.clone());

    let tags = refs.tail.iter().map(|r| {
        ToolCommand::new(crane)
            .arg("tag")
            .arg(refs.head.to_string())
            .arg(r.to_string())
            .current_dir(&target.cwd)
            .envs(vars.clone())
    });

    Ok(std::iter::once(push).chain(tags).collect())
}

/// Reference the tarball is loaded under: the first pushed reference when a
/// registry resolves, `image:first-tag` otherwise.
pub fn load_ref(config: &DockerImageConfig, target: &Target) -> Result<ImageRef, ScriptError> {
    match registry(config, target) {
        Some(_) => Ok(image_refs(config, target)?.head),
        None => ImageRef::parse(&config.display_name()).context(ImageReferenceSnafu),
    }
}

/// `buildx load` of the tarball under `reference`.
pub fn load_command(target: &Target, reference: &ImageRef) -> Result<ToolCommand, ScriptError> {
    Ok(ToolCommand::new(tool(target, "buildx")?)
        .arg("load")
        .arg(target.cwd.join(IMAGE_TARBALL).display().to_string())
        .arg(reference.to_string())
        .current_dir(&target.cwd)
        .envs(target.env_vars()))
}

async fn load(config: &DockerImageConfig, target: &Target) -> Result<(), ScriptError> {
    target.set_status(format!("Loading image {} to docker", config.display_name()));

    let reference = load_ref(config, target)?;
    load_command(target, &reference)?
        .run(target.name.as_str())
        .await
        .context(LoadSnafu)?;

    target.set_status(format!("Loaded {}", config.display_name()));
    Ok(())
}

pub(super) struct BuildImage {
    config: Arc<DockerImageConfig>,
}

impl BuildImage {
    pub(super) fn new(config: Arc<DockerImageConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Script for BuildImage {
    async fn run(&self, target: &Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
        target.set_status(format!("Building image {}", self.config.display_name()));

        let cmd = build_command(&self.config, target)?;
        cmd.run(target.name.as_str()).await.context(BuildSnafu)?;

        if self.config.daemon {
            load(&self.config, target).await?;
        }
        Ok(())
    }
}

pub(super) struct PushImage {
    config: Arc<DockerImageConfig>,
}

impl PushImage {
    pub(super) fn new(config: Arc<DockerImageConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Script for PushImage {
    async fn run(&self, target: &Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
        target.set_status(format!("Pushing image {}", self.config.display_name()));

        let refs = image_refs(&self.config, target)?;
        let mut commands = push_commands(target, &refs)?.into_iter();

        if let Some(push) = commands.next() {
            push.run(target.name.as_str()).await.context(PushSnafu)?;
        }
        for tag in commands {
            tag.run(target.name.as_str()).await.context(TagSnafu)?;
        }

        target.set_status(format!("Pushed {}", self.config.display_name()));
        Ok(())
    }
}

pub(super) struct LoadImage {
    config: Arc<DockerImageConfig>,
}

impl LoadImage {
    pub(super) fn new(config: Arc<DockerImageConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Script for LoadImage {
    async fn run(&self, target: &Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
        load(&self.config, target).await
    }
}
