// ABOUTME: Lifecycle scripts attached to targets and the errors they raise.
// ABOUTME: A script has an optional pre step that may amend the target, then a run step.

use super::{RuntimeContext, Target};
use crate::container::{EnvError, PortSpecError};
use crate::process::ToolError;
use crate::runtime::{ContainerError, ImageError, RuntimeError};
use crate::target::InterpolateError;
use crate::types::ParseImageRefError;
use async_trait::async_trait;
use snafu::Snafu;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait Script: Send + Sync {
    /// Runs before `run`, with the chance to amend the target.
    async fn pre(&self, _target: &mut Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
        Ok(())
    }

    async fn run(&self, target: &Target, ctx: &RuntimeContext) -> Result<(), ScriptError>;
}

/// A named script on a target, with the dependencies the host must run first.
#[derive(Clone)]
pub struct TargetScript {
    pub deps: Vec<String>,
    pub alias: Vec<String>,
    pub script: Arc<dyn Script>,
}

impl TargetScript {
    pub fn new(script: impl Script + 'static) -> Self {
        Self {
            deps: Vec::new(),
            alias: Vec::new(),
            script: Arc::new(script),
        }
    }

    pub fn deps(mut self, deps: Vec<String>) -> Self {
        self.deps = deps;
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias.push(alias.to_string());
        self
    }
}

impl std::fmt::Debug for TargetScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetScript")
            .field("deps", &self.deps)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ScriptError {
    #[snafu(display("{tool} tool is not set on the target"))]
    MissingTool { tool: String },

    #[snafu(display("interpolating build args: {source}"))]
    BuildArgs { source: InterpolateError },

    #[snafu(display("executing build: {source}"))]
    Build { source: ToolError },

    #[snafu(display("need to provide a docker registry or a default via DOCKER_REGISTRY env"))]
    MissingRegistry,

    #[snafu(display("invalid image reference: {source}"))]
    ImageReference { source: ParseImageRefError },

    #[snafu(display("executing push: {source}"))]
    Push { source: ToolError },

    #[snafu(display("tagging image: {source}"))]
    Tag { source: ToolError },

    #[snafu(display("executing load: {source}"))]
    Load { source: ToolError },

    #[snafu(display("creating docker client: {source}"))]
    Connect { source: RuntimeError },

    #[snafu(display("pulling image: {source}"))]
    Pull { source: ImageError },

    #[snafu(display("inspecting container {name}: {source}"))]
    Inspect { name: String, source: ContainerError },

    #[snafu(display("computing env for container: {source}"))]
    ContainerEnv { source: EnvError },

    #[snafu(display("computing port binds: {source}"))]
    PortBindings { source: PortSpecError },

    #[snafu(display("interpolating volume {volume}: {source}"))]
    Volume {
        volume: String,
        source: InterpolateError,
    },

    #[snafu(display("creating container: {source}"))]
    Create { source: ContainerError },

    #[snafu(display("starting container: {source}"))]
    Start { source: ContainerError },

    #[snafu(display("waiting for container: {source}"))]
    Wait { source: ContainerError },

    #[snafu(display("container {name} still running after {timeout:?}"))]
    WaitTimeout { name: String, timeout: Duration },

    #[snafu(display("container {name} exited with status {code}"))]
    Exited { name: String, code: i64 },
}
