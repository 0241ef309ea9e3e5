// ABOUTME: The target model that build-file types expand into.
// ABOUTME: Targets carry srcs, outs, tools, env and named lifecycle scripts.

mod error;
mod fields;
mod interpolate;
pub mod script;

pub use error::TargetError;
pub use fields::{BaseFields, DeployFields};
pub use interpolate::{InterpolateError, interpolate, interpolate_map};
pub use script::{Script, ScriptError, TargetScript};

use crate::types::TargetName;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What a type sees while expanding its build-file block into targets.
#[derive(Debug, Clone, Default)]
pub struct TargetConfigContext {
    /// Directory the build file lives in; becomes each target's cwd.
    pub cwd: PathBuf,
    /// Toolchain name to binary path, from the build file.
    pub known_toolchains: BTreeMap<String, String>,
}

impl TargetConfigContext {
    /// Resolve a toolchain: explicit override first, then the known set.
    pub fn toolchain(&self, name: &str, explicit: Option<&str>) -> Result<String, TargetError> {
        explicit
            .map(str::to_string)
            .or_else(|| self.known_toolchains.get(name).cloned())
            .ok_or_else(|| TargetError::MissingToolchain(name.to_string()))
    }
}

/// Per-invocation state handed to scripts.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// The script name being run (an alias is resolved to its script).
    pub script: String,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub name: TargetName,
    pub description: Option<String>,
    pub cwd: PathBuf,
    pub labels: Vec<String>,
    pub srcs: BTreeMap<String, Vec<String>>,
    pub outs: Vec<String>,
    pub tools: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    pub pass_env: Vec<String>,
    pub secret_env: Vec<String>,
    pub visibility: Vec<String>,
    pub scripts: BTreeMap<String, TargetScript>,
}

impl Target {
    pub fn new(base: &BaseFields, cwd: &Path) -> Self {
        Self {
            name: base.name.clone(),
            description: base.description.clone(),
            cwd: cwd.to_path_buf(),
            labels: base.labels.clone(),
            srcs: BTreeMap::new(),
            outs: Vec::new(),
            tools: BTreeMap::new(),
            env: base.env.clone(),
            pass_env: base.pass_env.clone(),
            secret_env: base.secret_env.clone(),
            visibility: base.visibility.clone(),
            scripts: BTreeMap::new(),
        }
    }

    pub fn with_srcs(mut self, srcs: BTreeMap<String, Vec<String>>) -> Self {
        self.srcs = srcs;
        self
    }

    pub fn with_outs(mut self, outs: Vec<String>) -> Self {
        self.outs = outs;
        self
    }

    pub fn with_tools(mut self, tools: BTreeMap<String, String>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_script(mut self, name: &str, script: TargetScript) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    /// Static env overlaid with the pass-through variables present in the
    /// OS environment. Names missing from the OS are skipped.
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.env.clone();
        for name in self.pass_env.iter().chain(&self.secret_env) {
            match std::env::var(name) {
                Ok(value) => {
                    vars.insert(name.clone(), value);
                }
                Err(_) => tracing::debug!(target_name = %self.name, "{name} not set, not passing"),
            }
        }
        vars
    }

    /// `KEY=VALUE` form of [`Target::env_vars`].
    pub fn env_list(&self) -> Vec<String> {
        self.env_vars()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect()
    }

    pub fn interpolate(&self, input: &str) -> Result<String, InterpolateError> {
        interpolate(input, &self.env_vars())
    }

    /// Path of a tool resolved when the target was created.
    pub fn tool(&self, name: &str) -> Option<&str> {
        self.tools.get(name).map(String::as_str)
    }

    pub fn set_status(&self, message: impl AsRef<str>) {
        tracing::info!(target_name = %self.name, "{}", message.as_ref());
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        tracing::debug!(target_name = %self.name, "{}", message.as_ref());
    }

    /// Find a script by name, falling back to aliases.
    pub fn find_script(&self, name: &str) -> Option<(&str, &TargetScript)> {
        if let Some((key, script)) = self.scripts.get_key_value(name) {
            return Some((key.as_str(), script));
        }
        self.scripts
            .iter()
            .find(|(_, script)| script.alias.iter().any(|a| a == name))
            .map(|(key, script)| (key.as_str(), script))
    }
}

/// Run one script of a target: `pre`, then `run`.
///
/// Script dependencies are not run here.
pub async fn run_script(target: &mut Target, name: &str) -> Result<(), TargetError> {
    let (script_name, script) = target
        .find_script(name)
        .map(|(n, s)| (n.to_string(), s.script.clone()))
        .ok_or_else(|| TargetError::UnknownScript {
            target: target.name.to_string(),
            script: name.to_string(),
        })?;

    let ctx = RuntimeContext {
        script: script_name.clone(),
    };
    let target_name = target.name.to_string();
    let wrap = |source| TargetError::Script {
        target: target_name.clone(),
        script: script_name.clone(),
        source,
    };

    script.pre(target, &ctx).await.map_err(wrap)?;
    script.run(target, &ctx).await.map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn base(name: &str) -> BaseFields {
        serde_yaml::from_str(&format!("name: {name}")).unwrap()
    }

    struct Counting {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Script for Counting {
        async fn pre(&self, target: &mut Target, ctx: &RuntimeContext) -> Result<(), ScriptError> {
            target.env.insert("SCRIPT".to_string(), ctx.script.clone());
            Ok(())
        }

        async fn run(&self, target: &Target, _ctx: &RuntimeContext) -> Result<(), ScriptError> {
            assert_eq!(target.env.get("SCRIPT").map(String::as_str), Some("deploy"));
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn toolchain_prefers_explicit_value() {
        let ctx = TargetConfigContext {
            cwd: PathBuf::from("/src"),
            known_toolchains: BTreeMap::from([("crane".to_string(), "/opt/crane".to_string())]),
        };
        assert_eq!(ctx.toolchain("crane", Some("/bin/crane")).unwrap(), "/bin/crane");
        assert_eq!(ctx.toolchain("crane", None).unwrap(), "/opt/crane");
        assert!(matches!(
            ctx.toolchain("buildx", None),
            Err(TargetError::MissingToolchain(name)) if name == "buildx"
        ));
    }

    #[test]
    fn pass_env_overlays_static_env() {
        let mut fields = base("api");
        fields.env.insert("STAGE".to_string(), "dev".to_string());
        fields.pass_env = vec!["STAGE".to_string(), "ZEN_TEST_ABSENT".to_string()];
        let target = Target::new(&fields, Path::new("/src"));

        temp_env::with_vars(
            [("STAGE", Some("prod")), ("ZEN_TEST_ABSENT", None)],
            || {
                let vars = target.env_vars();
                assert_eq!(vars.get("STAGE").map(String::as_str), Some("prod"));
                assert!(!vars.contains_key("ZEN_TEST_ABSENT"));
                assert_eq!(target.env_list(), vec!["STAGE=prod".to_string()]);
            },
        );
    }

    #[test]
    fn tool_lookup_has_no_fallback() {
        let target = Target::new(&base("api"), Path::new("/src")).with_tools(BTreeMap::from([(
            "crane".to_string(),
            "/opt/crane".to_string(),
        )]));

        assert_eq!(target.tool("crane"), Some("/opt/crane"));
        assert_eq!(target.tool("buildx"), None);
    }

    #[test]
    fn find_script_resolves_aliases() {
        let runs = Arc::new(AtomicUsize::new(0));
        let target = Target::new(&base("api"), Path::new("/src")).with_script(
            "deploy",
            TargetScript::new(Counting { runs }).alias("push"),
        );

        assert_eq!(target.find_script("deploy").map(|(n, _)| n), Some("deploy"));
        assert_eq!(target.find_script("push").map(|(n, _)| n), Some("deploy"));
        assert!(target.find_script("build").is_none());
    }

    #[tokio::test]
    async fn run_script_runs_pre_then_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut target = Target::new(&base("api"), Path::new("/src")).with_script(
            "deploy",
            TargetScript::new(Counting { runs: runs.clone() }).alias("push"),
        );

        run_script(&mut target, "push").await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_script_rejects_unknown_names() {
        let mut target = Target::new(&base("api"), Path::new("/src"));
        let err = run_script(&mut target, "build").await.unwrap_err();
        assert!(matches!(err, TargetError::UnknownScript { .. }));
    }
}
