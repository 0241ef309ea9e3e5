// ABOUTME: Application-wide error types for zen-docker.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::target::TargetError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("build file not found in {0}")]
    BuildFileNotFound(PathBuf),

    #[error("duplicate target name: {0}")]
    DuplicateTarget(String),

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
