//! YAML frontmatter parsing, rendering, and key-wise merging.

use serde_yaml::{Mapping, Value};

use crate::{error::QualiError, link};

/// Splits a document into its frontmatter mapping (empty if none) and body.
pub fn parse(content: &str) -> Result<(Mapping, String), QualiError> {
    match link::frontmatter_region(content) {
        Some(region) => {
            let yaml = &content[region];
            let mapping: Mapping = match serde_yaml::from_str::<Value>(yaml)? {
                Value::Mapping(m) => m,
                Value::Null => Mapping::new(),
                other => {
                    return Err(QualiError::Template(format!(
                        "frontmatter is not a key/value mapping: {other:?}"
                    )))
                }
            };
            let body_start = link::frontmatter_block_end(content).unwrap_or(content.len());
            Ok((mapping, content[body_start..].to_string()))
        }
        None => Ok((Mapping::new(), content.to_string())),
    }
}

/// Renders a frontmatter mapping and body back into document text.
pub fn render(frontmatter: &Mapping, body: &str) -> Result<String, QualiError> {
    if frontmatter.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        _ => false,
    }
}

fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

/// Merges `away`'s frontmatter into `keep`, key by key.
///
/// Keys on the ignore list are skipped. Equal values are skipped. An empty
/// or absent value in `keep` adopts `away`'s. Two arrays union (dedup,
/// keep-first order). A scalar conflict keeps `keep`'s value and returns
/// `away`'s as a discarded property; silent loss of conflicting metadata is
/// not acceptable, so the caller surfaces these in the merged document.
pub fn merge(keep: &mut Mapping, away: &Mapping, ignore_keys: &[String]) -> Vec<(String, Value)> {
    let mut discarded = Vec::new();
    for (key, away_value) in away {
        let name = key_string(key);
        if ignore_keys.contains(&name) {
            continue;
        }
        match keep.get_mut(key) {
            None => {
                keep.insert(key.clone(), away_value.clone());
            }
            Some(keep_value) if keep_value == away_value => {}
            Some(keep_value) if is_empty_value(keep_value) => {
                *keep_value = away_value.clone();
            }
            Some(Value::Sequence(keep_seq)) => {
                if let Value::Sequence(away_seq) = away_value {
                    for item in away_seq {
                        if !keep_seq.contains(item) {
                            keep_seq.push(item.clone());
                        }
                    }
                } else if !is_empty_value(away_value) {
                    discarded.push((name, away_value.clone()));
                }
            }
            Some(_) => {
                if !is_empty_value(away_value) {
                    discarded.push((name, away_value.clone()));
                }
            }
        }
    }
    discarded
}
