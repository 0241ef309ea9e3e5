// ABOUTME: Errors raised while turning build-file blocks into targets and running them.
// ABOUTME: Script failures are wrapped with the target and script that produced them.

use super::script::ScriptError;

#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("{0} toolchain is not configured")]
    MissingToolchain(String),

    #[error("unknown target type: {0}")]
    UnknownTargetType(String),

    #[error("target block is missing its type")]
    MissingType,

    #[error("decoding {kind} target: {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("target {target} has no script {script}")]
    UnknownScript { target: String, script: String },

    #[error("{target}:{script} failed: {source}")]
    Script {
        target: String,
        script: String,
        #[source]
        source: ScriptError,
    },
}
