//! Payload transformer: applies an ordered list of declarative, path-based
//! transforms to a JSON value. Pure — never performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use std::collections::HashMap;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid date_format input at {path}: {cause}")]
    InvalidDate { path: String, cause: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transform", rename_all = "snake_case")]
pub enum Transform {
    Map { map: HashMap<String, Value> },
    Template { template: String },
    DateFormat { format: String },
    Remove,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRule {
    pub path: String,
    #[serde(flatten)]
    pub transform: Transform,
}

/// Applies `rules` in order to `value`, returning the transformed value.
/// Missing paths are silently skipped.
pub fn apply(value: &Value, rules: &[TransformRule]) -> Result<Value, TransformError> {
    let mut out = value.clone();
    for rule in rules {
        apply_one(&mut out, &rule.path, &rule.transform)?;
    }
    Ok(out)
}

fn apply_one(root: &mut Value, path: &str, transform: &Transform) -> Result<(), TransformError> {
    let segments = parse_path(path);
    apply_at(root, &segments, path, transform)
}

/// A path segment: a plain key, or a key flagged `each` (written `name[]` in
/// the path string) meaning "apply to every element of the array at `name`".
struct Segment {
    key: String,
    each: bool,
}

fn parse_path(path: &str) -> Vec<Segment> {
    path.split('.')
        .map(|raw| {
            if let Some(stripped) = raw.strip_suffix("[]") {
                Segment {
                    key: stripped.to_string(),
                    each: true,
                }
            } else {
                Segment {
                    key: raw.to_string(),
                    each: false,
                }
            }
        })
        .collect()
}

fn apply_at(
    current: &mut Value,
    segments: &[Segment],
    full_path: &str,
    transform: &Transform,
) -> Result<(), TransformError> {
    let Some((seg, rest)) = segments.split_first() else {
        return Ok(());
    };

    let Value::Object(map) = current else {
        return Ok(());
    };
    let Some(child) = map.get_mut(&seg.key) else {
        return Ok(());
    };

    if seg.each {
        let Value::Array(items) = child else {
            return Ok(());
        };
        if rest.is_empty() {
            for item in items.iter_mut() {
                apply_leaf(item, full_path, transform)?;
            }
        } else {
            for item in items.iter_mut() {
                apply_at(item, rest, full_path, transform)?;
            }
        }
        return Ok(());
    }

    if rest.is_empty() {
        if matches!(transform, Transform::Remove) {
            map.remove(&seg.key);
            return Ok(());
        }
        apply_leaf(child, full_path, transform)?;
    } else {
        apply_at(child, rest, full_path, transform)?;
    }
    Ok(())
}

fn apply_leaf(value: &mut Value, path: &str, transform: &Transform) -> Result<(), TransformError> {
    match transform {
        Transform::Map { map } => {
            let key = value_as_map_key(value);
            if let Some(replacement) = map.get(&key) {
                *value = replacement.clone();
            }
        }
        Transform::Template { template } => {
            *value = Value::String(render_template(template, value));
        }
        Transform::DateFormat { format } => {
            let formatted = format_date(value, format).map_err(|cause| TransformError::InvalidDate {
                path: path.to_string(),
                cause,
            })?;
            *value = Value::String(formatted);
        }
        Transform::Remove => {
            // Removal at a non-terminal leaf (e.g. inside an `each` loop) has
            // no well-defined target; leave the value unchanged.
        }
    }
    Ok(())
}

fn value_as_map_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_template(template: &str, value: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let inner = &template[i + 1..i + end];
                if let Some(field) = inner.strip_prefix("value.") {
                    let resolved = value
                        .get(field)
                        .map(value_as_map_key)
                        .unwrap_or_default();
                    out.push_str(&resolved);
                    i += end + 1;
                    continue;
                } else if inner == "value" {
                    out.push_str(&value_as_map_key(value));
                    i += end + 1;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    let _ = &mut chars;
    out
}

fn format_date(value: &Value, format: &str) -> Result<String, String> {
    let raw = value.as_str().ok_or("expected a string value")?;
    let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| e.to_string())?;
    Ok(parsed.format(&translate_format(format)).to_string())
}

/// Translates `YYYY`/`MM`/`DD`/`HH`/`mm`/`ss` date-format tokens into
/// `chrono::format::strftime` specifiers.
fn translate_format(format: &str) -> String {
    format
        .replace("YYYY", "%Y")
        .replace("MM", "%m")
        .replace("DD", "%d")
        .replace("HH", "%H")
        .replace("mm", "%M")
        .replace("ss", "%S")
}
