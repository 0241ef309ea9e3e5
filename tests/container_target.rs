// ABOUTME: Integration tests for docker_container deploys against an in-memory engine.
// ABOUTME: Covers the existing-container short circuit, the create spec, and waiting for exit.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use zen_docker::container::{
    DeployOutcome, DockerContainerConfig, container_spec, deploy_container, run_command_line,
};
use zen_docker::registry::TargetCreator;
use zen_docker::runtime::{
    ContainerError, ContainerOps, ContainerPort, ContainerSpec, ImageError, ImageOps, Protocol,
};
use zen_docker::target::{ScriptError, Target, TargetConfigContext};
use zen_docker::types::{ContainerId, ImageRef};

#[derive(Default)]
struct FakeEngine {
    existing: bool,
    exit_code: i64,
    wait_for: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeEngine {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        self.record(format!("pull {reference}"));
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn container_exists(&self, name: &str) -> Result<bool, ContainerError> {
        self.record(format!("exists {name}"));
        Ok(self.existing)
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        self.record(format!("create {}", spec.name));
        Ok(ContainerId::new("0123456789abcdef0123"))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.record(format!("start {}", id.short()));
        Ok(())
    }

    async fn wait_container(&self, id: &ContainerId) -> Result<i64, ContainerError> {
        self.record(format!("wait {}", id.short()));
        if let Some(delay) = self.wait_for {
            tokio::time::sleep(delay).await;
        }
        Ok(self.exit_code)
    }
}

fn container(yaml: &str, cwd: &Path) -> (DockerContainerConfig, Target) {
    let config: DockerContainerConfig = serde_yaml::from_str(yaml).unwrap();
    let ctx = TargetConfigContext {
        cwd: cwd.to_path_buf(),
        ..Default::default()
    };
    let target = config.get_targets(&ctx).unwrap().remove(0);
    (config, target)
}

const DB: &str = r#"
name: db
image: postgres:16
container: pg
env:
  PASSWORD: hunter2
container_env:
  POSTGRES_PASSWORD: ${PASSWORD}
ports:
  5432: 15432
volumes:
  data: /var/lib/postgresql/data
memory: 512
cpu: 2
command: postgres -c fsync=off
"#;

mod deploy {
    use super::*;

    #[tokio::test]
    async fn creates_and_starts_a_new_container() {
        let (config, target) = container(DB, Path::new("/srv/db"));
        let engine = FakeEngine::default();

        let outcome = deploy_container(&config, &target, &engine).await.unwrap();

        assert!(matches!(outcome, DeployOutcome::Started(ref id) if id.short() == "0123456789ab"));
        assert_eq!(
            engine.calls(),
            vec![
                "pull postgres:16",
                "exists pg",
                "create pg",
                "start 0123456789ab"
            ]
        );
    }

    #[tokio::test]
    async fn existing_container_is_left_alone() {
        let (config, target) = container(DB, Path::new("/srv/db"));
        let engine = FakeEngine {
            existing: true,
            ..Default::default()
        };

        let outcome = deploy_container(&config, &target, &engine).await.unwrap();

        assert_eq!(outcome, DeployOutcome::AlreadyExists);
        assert_eq!(engine.calls(), vec!["pull postgres:16", "exists pg"]);
    }

    #[tokio::test]
    async fn foreground_container_is_waited_for() {
        let yaml = "name: migrate\nimage: acme/migrate:v2\ndaemon: false\n";
        let (config, target) = container(yaml, Path::new("/srv"));
        let engine = FakeEngine::default();

        let outcome = deploy_container(&config, &target, &engine).await.unwrap();

        assert!(matches!(outcome, DeployOutcome::Completed(_)));
        assert_eq!(engine.calls().last().unwrap(), "wait 0123456789ab");
    }

    #[tokio::test]
    async fn non_zero_exit_is_an_error() {
        let yaml = "name: migrate\nimage: acme/migrate:v2\ndaemon: false\n";
        let (config, target) = container(yaml, Path::new("/srv"));
        let engine = FakeEngine {
            exit_code: 2,
            ..Default::default()
        };

        let err = deploy_container(&config, &target, &engine).await.unwrap_err();
        assert!(matches!(err, ScriptError::Exited { ref name, code: 2 } if name == "migrate"));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_timeout_is_enforced() {
        let yaml = "name: migrate\nimage: acme/migrate:v2\ndaemon: false\nwait_timeout: 5s\n";
        let (config, target) = container(yaml, Path::new("/srv"));
        let engine = FakeEngine {
            wait_for: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        let err = deploy_container(&config, &target, &engine).await.unwrap_err();
        assert!(matches!(err, ScriptError::WaitTimeout { timeout, .. } if timeout == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn bad_port_spec_fails_before_create() {
        let yaml = "name: web\nimage: nginx\nports:\n  80-81: 8080\n";
        let (config, target) = container(yaml, Path::new("/srv"));
        let engine = FakeEngine::default();

        let err = deploy_container(&config, &target, &engine).await.unwrap_err();
        assert!(matches!(err, ScriptError::PortBindings { .. }));
        assert!(!engine.calls().iter().any(|c| c.starts_with("create")));
    }
}

mod create_spec {
    use super::*;

    #[test]
    fn spec_carries_env_ports_mounts_and_limits() {
        let (config, target) = container(DB, Path::new("/srv/db"));
        let spec = container_spec(&config, &target).unwrap();

        assert_eq!(spec.name, "pg");
        assert_eq!(spec.env, vec!["POSTGRES_PASSWORD=hunter2".to_string()]);
        assert_eq!(
            spec.cmd,
            Some(vec!["postgres".to_string(), "-c".to_string(), "fsync=off".to_string()])
        );
        assert_eq!(spec.entrypoint, None);

        let port = ContainerPort {
            port: 5432,
            protocol: Protocol::Tcp,
        };
        let binding = spec.port_bindings.get(&port).unwrap();
        assert_eq!(binding.host_ip, "127.0.0.1");
        assert_eq!(binding.host_port, Some(15432));

        assert_eq!(spec.mounts.len(), 1);
        assert_eq!(spec.mounts[0].source, "/srv/db/data");
        assert_eq!(spec.mounts[0].target, "/var/lib/postgresql/data");

        assert_eq!(spec.resources.memory, Some(512_000_000));
        assert_eq!(spec.resources.nano_cpus, Some(2_000_000_000));
    }

    #[test]
    fn container_name_defaults_to_target_name() {
        let (config, target) = container("name: cache\nimage: redis:7\n", Path::new("/srv"));
        let spec = container_spec(&config, &target).unwrap();

        assert_eq!(spec.name, "cache");
        assert_eq!(spec.resources.memory, None);
        assert!(spec.port_bindings.is_empty());
    }

    #[test]
    fn absolute_volume_sources_are_kept() {
        let yaml = "name: web\nimage: nginx\nvolumes:\n  /etc/nginx: /etc/nginx\n";
        let (config, target) = container(yaml, Path::new("/srv"));
        let spec = container_spec(&config, &target).unwrap();
        assert_eq!(spec.mounts[0].source, "/etc/nginx");
    }

    #[test]
    fn run_line_mirrors_the_create_spec() {
        let (config, target) = container(DB, Path::new("/srv/db"));
        let line = run_command_line(&config, &target).unwrap().join(" ");

        assert_eq!(
            line,
            "docker run --name pg -d -e POSTGRES_PASSWORD=hunter2 -p 127.0.0.1:15432:5432 \
             -v /srv/db/data:/var/lib/postgresql/data postgres:16 postgres -c fsync=off"
        );
    }
}

mod run_line {
    use super::*;

    fn publish_flags(ports: &str) -> Vec<String> {
        let yaml = format!("name: web\nimage: nginx\nports:\n{ports}");
        let (config, target) = container(&yaml, Path::new("/srv"));
        let line = run_command_line(&config, &target).unwrap();
        line.windows(2)
            .filter(|w| w[0] == "-p")
            .map(|w| w[1].clone())
            .collect()
    }

    #[test]
    fn host_ip_defaults_to_loopback() {
        assert_eq!(publish_flags("  80: 8080\n"), vec!["127.0.0.1:8080:80"]);
    }

    #[test]
    fn explicit_ip_protocol_and_ranges_are_kept() {
        assert_eq!(
            publish_flags("  53/udp: \"0.0.0.0:5353\"\n  7000-7001: \"[::1]:17000-17001\"\n"),
            vec!["0.0.0.0:5353:53/udp", "[::1]:17000:7000", "[::1]:17001:7001"]
        );
    }

    #[test]
    fn empty_host_port_leaves_the_choice_to_the_engine() {
        assert_eq!(publish_flags("  80: \"0.0.0.0:\"\n"), vec!["0.0.0.0::80"]);
    }
}

mod engine {
    use super::*;
    use zen_docker::runtime::{BollardRuntime, detect_local};

    #[tokio::test]
    async fn absent_container_is_reported_missing() {
        if detect_local().is_err() {
            eprintln!("no local container runtime, skipping");
            return;
        }
        let runtime = match BollardRuntime::connect_local().await {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("runtime not reachable ({e}), skipping");
                return;
            }
        };

        let exists = runtime
            .container_exists("zen-docker-test-no-such-container")
            .await
            .unwrap();
        assert!(!exists);
    }
}
