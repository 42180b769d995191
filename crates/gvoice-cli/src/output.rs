//! Output formatting and control utilities.

use gvoice_core::GvError;
use serde::Serialize;
use serde_json::{json, Value};

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub fields: Option<String>,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Render data according to output controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(json!(null));

        let filtered = match self.fields {
            Some(ref fields) => filter_fields(&value, fields),
            None => value,
        };

        let truncated = match self.max_text_chars {
            Some(max_chars) => truncate_text_fields(&filtered, max_chars as usize),
            None => filtered,
        };

        if self.compact {
            serde_json::to_string(&truncated).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&truncated).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Print data to stdout according to output controls.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }

    /// Truncate free text for human output the same way `--max-text-chars`
    /// does for JSON.
    pub fn clip(&self, text: &str) -> String {
        match self.max_text_chars {
            Some(max_chars) => truncate(text, max_chars as usize),
            None => text.to_string(),
        }
    }
}

/// Keep only the listed fields of each object.
///
/// Objects nested one level down (a folder's `messages`) are filtered too,
/// so `--fields id,phone_number` works on folder listings.
fn filter_fields(value: &Value, fields: &str) -> Value {
    let field_list: Vec<&str> = fields.split(',').map(|s| s.trim()).collect();

    match value {
        Value::Array(arr) => Value::Array(arr.iter().map(|v| filter_fields(v, fields)).collect()),
        Value::Object(map) => {
            let mut filtered = serde_json::Map::new();
            for field in &field_list {
                if let Some(v) = map.get(*field) {
                    filtered.insert(field.to_string(), v.clone());
                }
            }
            for (key, nested) in map {
                if let Value::Array(items) = nested {
                    if !filtered.contains_key(key) && items.iter().any(Value::is_object) {
                        filtered.insert(key.clone(), filter_fields(nested, fields));
                    }
                }
            }
            Value::Object(filtered)
        }
        _ => value.clone(),
    }
}

/// Truncate string fields in a JSON value.
fn truncate_text_fields(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) => Value::String(truncate(s, max_chars)),
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| truncate_text_fields(v, max_chars)).collect())
        }
        Value::Object(map) => {
            let mut truncated = serde_json::Map::new();
            for (k, v) in map {
                truncated.insert(k.clone(), truncate_text_fields(v, max_chars));
            }
            Value::Object(truncated)
        }
        _ => value.clone(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{}...", head)
}

/// One-line description of an error and its causes.
///
/// Library errors already embed their source in their message, so a cause
/// whose text the previous line shows is skipped.
pub fn describe(error: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if parts.last().map_or(true, |prev| !prev.contains(&text)) {
            parts.push(text);
        }
    }
    parts.join(": ")
}

/// Format an error as JSON, with a stable code when it came from the library.
pub fn format_error(error: &anyhow::Error) -> String {
    let code = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<GvError>())
        .map(GvError::code)
        .unwrap_or("ERROR");

    serde_json::to_string(&json!({
        "success": false,
        "code": code,
        "error": describe(error),
    }))
    .unwrap_or_else(|_| format!(r#"{{"success":false,"code":"{}"}}"#, code))
}
