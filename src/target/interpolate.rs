// ABOUTME: Shell-style variable interpolation against a target's environment.
// ABOUTME: Supports ${NAME}, $NAME and $$; unknown names are errors.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpolateError {
    #[error("unknown variable {0}")]
    Unknown(String),

    #[error("unterminated variable reference in {0:?}")]
    Unterminated(String),

    #[error("empty variable reference in {0:?}")]
    EmptyName(String),
}

/// Substitute variable references in `input` with values from `vars`.
///
/// A `$` not followed by `{`, `$`, a letter or `_` is kept as is, so
/// strings like `cost: 5$` pass through untouched.
pub fn interpolate(input: &str, vars: &BTreeMap<String, String>) -> Result<String, InterpolateError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(InterpolateError::Unterminated(input.to_string()));
                }
                if name.is_empty() {
                    return Err(InterpolateError::EmptyName(input.to_string()));
                }
                out.push_str(lookup(&name, vars)?);
            }
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '_' || c.is_ascii_alphanumeric() {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(lookup(&name, vars)?);
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

/// Interpolate every value of `map`, keeping keys as they are.
pub fn interpolate_map(
    map: &BTreeMap<String, String>,
    vars: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, InterpolateError> {
    map.iter()
        .map(|(k, v)| interpolate(v, vars).map(|v| (k.clone(), v)))
        .collect()
}

fn lookup<'a>(name: &str, vars: &'a BTreeMap<String, String>) -> Result<&'a str, InterpolateError> {
    vars.get(name)
        .map(String::as_str)
        .ok_or_else(|| InterpolateError::Unknown(name.to_string()))
}
