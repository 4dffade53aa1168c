use crate::errors::ToolError;
use serde_json::{Map, Value};

/// An argument counts as supplied when it is non-null and, for strings, not
/// blank. `false` and `0` are real values and stay.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        _ => true,
    }
}

pub fn present_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Keeps only the entries whose value [`is_present`].
pub fn retain_present(args: &Map<String, Value>) -> Map<String, Value> {
    args.iter()
        .filter(|(_, v)| is_present(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Copies the listed keys that are present, in the order given.
pub fn pick(args: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    let mut out = Map::new();
    for key in keys {
        if let Some(value) = args.get(*key).filter(|v| is_present(v)) {
            out.insert((*key).to_string(), value.clone());
        }
    }
    out
}

/// Flattens a JSON object into query/form pairs. Arrays repeat the key,
/// nulls are dropped, nested objects are sent as JSON text.
pub fn to_pairs(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push((key.clone(), render_scalar(item)));
                }
            }
            other => pairs.push((key.clone(), render_scalar(other))),
        }
    }
    pairs
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Reads a path-positional argument and renders it as a single URL segment.
pub fn path_segment(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    let rendered = match args.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Number(num)) => num.to_string(),
        Some(Value::Null) | None => {
            return Err(ToolError::invalid_params(format!(
                "{}: missing required field",
                key
            )))
        }
        Some(_) => {
            return Err(ToolError::invalid_params(format!(
                "{}: expected string or integer",
                key
            )))
        }
    };
    if rendered.is_empty() {
        return Err(ToolError::invalid_params(format!("{}: must not be empty", key)));
    }
    if rendered.contains(['/', '\\', '?', '#']) {
        return Err(ToolError::invalid_params(format!(
            "{}: must not contain '/', '\\', '?' or '#'",
            key
        )));
    }
    if is_dot_segment(&rendered) {
        return Err(ToolError::invalid_params(format!(
            "{}: must not be a '.' or '..' segment",
            key
        )));
    }
    Ok(rendered)
}

/// URL parsers collapse `.`/`..` segments, including the `%2e` spellings.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Comma-separated list, trimmed, blanks removed.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}
