// ABOUTME: The docker_container target type.
// ABOUTME: Deploys a container through the Docker Engine API, skipping ones that already exist.

mod env;
mod ports;

pub use env::{CONTAINER_ENV_LABEL, ENV_FILE_LABEL, EnvError, get_container_env};
pub use ports::{DEFAULT_HOST_IP, PortSpecError, get_port_bindings};

use crate::config::deserialize::{deserialize_image_ref, deserialize_string_map};
use crate::registry::TargetCreator;
use crate::runtime::{
    BindMount, BollardRuntime, ContainerPort, ContainerSpec, Engine, HostBinding, Protocol,
    ResourceLimits,
};
use crate::target::script::{
    ConnectSnafu, ContainerEnvSnafu, CreateSnafu, ExitedSnafu, InspectSnafu, PortBindingsSnafu,
    PullSnafu, StartSnafu, VolumeSnafu, WaitSnafu, WaitTimeoutSnafu,
};
use crate::target::{
    BaseFields, RuntimeContext, Script, ScriptError, Target, TargetConfigContext, TargetError,
    TargetScript,
};
use crate::types::{ContainerId, ImageRef};
use async_trait::async_trait;
use serde::Deserialize;
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Target env entry holding the equivalent `docker run` line.
pub const DEBUG_CMD_ENV: &str = "ZEN_DEBUG_CMD";

#[derive(Debug, Clone, Deserialize)]
pub struct DockerContainerConfig {
    #[serde(flatten)]
    pub base: BaseFields,

    /// Memory limit in megabytes.
    #[serde(default)]
    pub memory: Option<u32>,

    /// CPU limit in cores.
    #[serde(default)]
    pub cpu: Option<u32>,

    /// Container name; defaults to the target name.
    #[serde(default, rename = "container")]
    pub container_name: Option<String>,

    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    /// Env files relative to the target cwd, one `KEY=VALUE` per line.
    #[serde(default)]
    pub env_files: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub container_env: BTreeMap<String, String>,

    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub entrypoint: Option<String>,

    /// Leave the container running; when false, wait for it to exit.
    #[serde(default = "default_daemon")]
    pub daemon: bool,

    /// Host path to container path. Host paths are interpolated.
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub volumes: BTreeMap<String, String>,

    /// Container port spec to host port spec.
    #[serde(default, deserialize_with = "deserialize_string_map")]
    pub ports: BTreeMap<String, String>,

    #[serde(default, with = "humantime_serde")]
    pub wait_timeout: Option<Duration>,
}

fn default_daemon() -> bool {
    true
}

impl DockerContainerConfig {
    pub fn container_name(&self) -> &str {
        self.container_name
            .as_deref()
            .unwrap_or_else(|| self.base.name.as_str())
    }
}

impl TargetCreator for DockerContainerConfig {
    fn get_targets(&self, ctx: &TargetConfigContext) -> Result<Vec<Target>, TargetError> {
        let mut base = self.base.clone();
        for (k, v) in &self.container_env {
            base.labels.push(format!("{CONTAINER_ENV_LABEL}{k}={v}"));
        }
        for file in &self.env_files {
            base.labels.push(format!("{ENV_FILE_LABEL}{file}"));
        }

        let target = Target::new(&base, &ctx.cwd)
            .with_srcs(BTreeMap::from([(
                "_envs".to_string(),
                self.env_files.clone(),
            )]))
            .with_outs(self.env_files.clone())
            .with_script(
                "deploy",
                TargetScript::new(DeployContainer {
                    config: Arc::new(self.clone()),
                })
                .deps(self.base.deps.clone()),
            );

        Ok(vec![target])
    }
}

/// What a deploy run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// A container with the name existed; nothing was changed.
    AlreadyExists,
    /// Created and started, left running.
    Started(ContainerId),
    /// Created, started, and exited with status 0.
    Completed(ContainerId),
}

fn split_words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

fn bind_mounts(
    config: &DockerContainerConfig,
    target: &Target,
) -> Result<Vec<BindMount>, ScriptError> {
    config
        .volumes
        .iter()
        .map(|(host, container)| {
            let source = target
                .interpolate(host)
                .context(VolumeSnafu { volume: host })?;
            let source = if Path::new(&source).is_relative() {
                target.cwd.join(&source).display().to_string()
            } else {
                source
            };
            Ok(BindMount {
                source,
                target: container.clone(),
            })
        })
        .collect()
}

/// Engine-level description of the container to create.
pub fn container_spec(
    config: &DockerContainerConfig,
    target: &Target,
) -> Result<ContainerSpec, ScriptError> {
    let env = get_container_env(target).context(ContainerEnvSnafu)?;
    let port_bindings = get_port_bindings(&config.ports).context(PortBindingsSnafu)?;
    let mounts = bind_mounts(config, target)?;

    Ok(ContainerSpec {
        name: config.container_name().to_string(),
        image: config.image.clone(),
        env,
        cmd: config.command.as_deref().map(split_words),
        entrypoint: config.entrypoint.as_deref().map(split_words),
        port_bindings,
        mounts,
        resources: ResourceLimits {
            memory: config.memory.map(|mb| i64::from(mb) * 1_000_000),
            nano_cpus: config.cpu.map(|cores| i64::from(cores) * 1_000_000_000),
        },
    })
}

/// `-p` value for one binding: `ip:host:container[/proto]`, with the host
/// port left empty when the engine picks it.
fn publish_flag(port: &ContainerPort, binding: &HostBinding) -> String {
    let ip = if binding.host_ip.contains(':') {
        format!("[{}]", binding.host_ip)
    } else {
        binding.host_ip.clone()
    };
    let host_port = binding.host_port.map(|p| p.to_string()).unwrap_or_default();
    match port.protocol {
        Protocol::Tcp => format!("{ip}:{host_port}:{}", port.port),
        _ => format!("{ip}:{host_port}:{port}"),
    }
}

/// The `docker run` line equivalent to what a deploy creates.
pub fn run_command_line(
    config: &DockerContainerConfig,
    target: &Target,
) -> Result<Vec<String>, ScriptError> {
    let mut cmd = vec![
        "docker".to_string(),
        "run".to_string(),
        "--name".to_string(),
        config.container_name().to_string(),
    ];
    if config.daemon {
        cmd.push("-d".to_string());
    }

    for e in get_container_env(target).context(ContainerEnvSnafu)? {
        cmd.extend(["-e".to_string(), e]);
    }
    for (port, binding) in get_port_bindings(&config.ports).context(PortBindingsSnafu)? {
        cmd.extend(["-p".to_string(), publish_flag(&port, &binding)]);
    }
    for mount in bind_mounts(config, target)? {
        cmd.extend(["-v".to_string(), format!("{}:{}", mount.source, mount.target)]);
    }
    if let Some(ref entrypoint) = config.entrypoint {
        cmd.extend(["--entrypoint".to_string(), entrypoint.clone()]);
    }

    cmd.push(config.image.to_string());
    if let Some(ref command) = config.command {
        cmd.extend(split_words(command));
    }

    Ok(cmd)
}

/// Pull the image and create and start the container unless one with the
/// same name already exists. Existing containers are not reconciled.
pub async fn deploy_container<E>(
    config: &DockerContainerConfig,
    target: &Target,
    engine: &E,
) -> Result<DeployOutcome, ScriptError>
where
    E: Engine + ?Sized,
{
    let name = config.container_name();

    target.set_status(format!("Pulling image {}", config.image));
    engine.pull_image(&config.image).await.context(PullSnafu)?;

    if engine
        .container_exists(name)
        .await
        .context(InspectSnafu { name })?
    {
        target.debug(format!("Container {name} already exists"));
        return Ok(DeployOutcome::AlreadyExists);
    }

    let spec = container_spec(config, target)?;

    target.set_status(format!("Creating container {name}"));
    let id = engine.create_container(&spec).await.context(CreateSnafu)?;

    target.set_status(format!("Starting container {name}"));
    engine.start_container(&id).await.context(StartSnafu)?;
    target.debug(format!("Container {name} ({}) created and started", id.short()));

    if config.daemon {
        return Ok(DeployOutcome::Started(id));
    }

    target.set_status(format!("Waiting for container {name}"));
    let code = match config.wait_timeout {
        Some(timeout) => tokio::time::timeout(timeout, engine.wait_container(&id))
            .await
            .map_err(|_| WaitTimeoutSnafu { name, timeout }.build())?,
        None => engine.wait_container(&id).await,
    }
    .context(WaitSnafu)?;

    if code != 0 {
        return ExitedSnafu { name, code }.fail();
    }

    Ok(DeployOutcome::Completed(id))
}

struct DeployContainer {
    config: Arc<DockerContainerConfig>,
}

#[async_trait]
impl Script for DeployContainer {
    async fn pre(&self, target: &mut Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
        let line = run_command_line(&self.config, target)?.join(" ");
        target.debug(&line);
        target.env.insert(DEBUG_CMD_ENV.to_string(), line);
        Ok(())
    }

    async fn run(&self, target: &Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
        let engine = BollardRuntime::connect_local().await.context(ConnectSnafu)?;
        deploy_container(&self.config, target, &engine).await?;
        Ok(())
    }
}
