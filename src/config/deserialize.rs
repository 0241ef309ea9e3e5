// ABOUTME: Custom serde deserializers for build-file fields.
// ABOUTME: Handles image refs, tag lists, and scalar maps written without quotes.

use nonempty::NonEmpty;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::types::ImageRef;

pub fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

/// An empty or absent list means `["latest"]`.
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let tags: Vec<String> = Vec::deserialize(deserializer)?;
    if let Some(tag) = tags.iter().find(|t| t.is_empty() || t.contains([':', '/', '@'])) {
        return Err(serde::de::Error::custom(format!("invalid tag {tag:?}")));
    }
    Ok(NonEmpty::from_vec(tags).unwrap_or_else(|| NonEmpty::new("latest".to_string())))
}

/// Map whose keys and values may be any YAML scalar, e.g. `8080: 80`.
pub fn deserialize_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mapping = serde_yaml::Mapping::deserialize(deserializer)?;
    mapping
        .into_iter()
        .map(|(k, v)| {
            let k = scalar_to_string(k).map_err(serde::de::Error::custom)?;
            let v = scalar_to_string(v).map_err(serde::de::Error::custom)?;
            Ok((k, v))
        })
        .collect()
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        other => Err(format!("expected a string, number or bool, found {other:?}")),
    }
}
