// ABOUTME: Assembles a container's environment from target labels.
// ABOUTME: container_env= labels are interpolated; env_file= labels are read line by line.

use crate::target::{InterpolateError, Target};
use std::path::PathBuf;
use thiserror::Error;

pub const CONTAINER_ENV_LABEL: &str = "container_env=";
pub const ENV_FILE_LABEL: &str = "env_file=";

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("interpolating label {label}: {source}")]
    Label {
        label: String,
        #[source]
        source: InterpolateError,
    },

    #[error("reading env file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("interpolating env {line}: {source}")]
    Line {
        line: String,
        #[source]
        source: InterpolateError,
    },
}

/// `KEY=VALUE` entries for the container, in label order.
///
/// Env file lines are taken verbatim apart from interpolation: empty lines are
/// skipped, nothing is unquoted or unescaped.
pub fn get_container_env(target: &Target) -> Result<Vec<String>, EnvError> {
    let vars = target.env_vars();
    let mut env = Vec::new();

    for label in &target.labels {
        if let Some(entry) = label.strip_prefix(CONTAINER_ENV_LABEL) {
            let value = crate::target::interpolate(entry, &vars).map_err(|source| EnvError::Label {
                label: label.clone(),
                source,
            })?;
            env.push(value);
        } else if let Some(file) = label.strip_prefix(ENV_FILE_LABEL) {
            let path = target.cwd.join(file);
            let content = std::fs::read_to_string(&path)
                .map_err(|source| EnvError::Read { path, source })?;

            for line in content.split('\n').filter(|l| !l.is_empty()) {
                let value = crate::target::interpolate(line, &vars).map_err(|source| {
                    EnvError::Line {
                        line: line.to_string(),
                        source,
                    }
                })?;
                env.push(value);
            }
        }
    }

    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::BaseFields;

    fn target(dir: &std::path::Path, labels: &[&str]) -> Target {
        let mut base: BaseFields = serde_yaml::from_str("name: db").unwrap();
        base.env.insert("DB_HOST".to_string(), "postgres".to_string());
        base.labels = labels.iter().map(|l| l.to_string()).collect();
        Target::new(&base, dir)
    }

    #[test]
    fn container_env_labels_are_interpolated() {
        let dir = tempfile::tempdir().unwrap();
        let target = target(dir.path(), &["team=core", "container_env=HOST=${DB_HOST}"]);

        let env = get_container_env(&target).unwrap();
        assert_eq!(env, vec!["HOST=postgres".to_string()]);
    }

    #[test]
    fn env_file_lines_follow_label_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("db.env"), "USER=app\n\nURL=pg://$DB_HOST/app\n").unwrap();
        let target = target(
            dir.path(),
            &["container_env=FIRST=1", "env_file=db.env", "container_env=LAST=2"],
        );

        let env = get_container_env(&target).unwrap();
        assert_eq!(
            env,
            vec![
                "FIRST=1".to_string(),
                "USER=app".to_string(),
                "URL=pg://postgres/app".to_string(),
                "LAST=2".to_string(),
            ]
        );
    }

    #[test]
    fn quotes_are_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q.env"), "GREETING=\"hello world\"\n").unwrap();
        let target = target(dir.path(), &["env_file=q.env"]);

        let env = get_container_env(&target).unwrap();
        assert_eq!(env, vec!["GREETING=\"hello world\"".to_string()]);
    }

    #[test]
    fn missing_env_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = target(dir.path(), &["env_file=absent.env"]);

        let err = get_container_env(&target).unwrap_err();
        assert!(matches!(err, EnvError::Read { .. }));
    }

    #[test]
    fn unknown_variable_in_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.env"), "X=${MISSING}\n").unwrap();
        let target = target(dir.path(), &["env_file=bad.env"]);

        let err = get_container_env(&target).unwrap_err();
        assert!(matches!(err, EnvError::Line { .. }));
    }
}
