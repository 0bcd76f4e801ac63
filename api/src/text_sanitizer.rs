//! Free-text cleanup applied to entity payloads before they are persisted.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Text fields sanitized on create and update unless a route names its own.
pub const DEFAULT_TEXT_FIELDS: &[&str] = &["name", "description", "message"];

pub const DEFAULT_OBJECT_DEPTH: usize = 5;

static DANGEROUS_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn dangerous_patterns() -> &'static [Regex] {
    DANGEROUS_PATTERNS.get_or_init(|| {
        [
            // complete script blocks, then stray opening or closing tags
            r"(?is)<script\b[^>]*>.*?</script\s*>",
            r"(?i)</?script\b[^>]*>?",
            // inline event handlers with their value
            r#"(?i)(^|[\s/"'<])on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#,
            r"(?i)javascript\s*:",
            r"(?i)vbscript\s*:",
            r"(?i)data\s*:\s*text/html",
            r"(?i)expression\s*\(",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    })
}

#[derive(Debug, Clone, Copy)]
pub struct TextSanitizeOptions {
    pub escape_html: bool,
    pub strip_dangerous: bool,
    pub trim: bool,
}

impl Default for TextSanitizeOptions {
    fn default() -> Self {
        Self {
            escape_html: true,
            strip_dangerous: true,
            trim: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectSanitizeOptions {
    pub text: TextSanitizeOptions,
    /// Keys whose string values are sanitized; `None` means every string leaf.
    pub fields: Option<Vec<String>>,
    /// Keys left untouched, including everything below them.
    pub exclude: Vec<String>,
    pub max_depth: usize,
}

impl Default for ObjectSanitizeOptions {
    fn default() -> Self {
        Self {
            text: TextSanitizeOptions::default(),
            fields: None,
            exclude: Vec::new(),
            max_depth: DEFAULT_OBJECT_DEPTH,
        }
    }
}

/// Trims, strips dangerous markup, then escapes HTML-significant characters.
///
/// Stripping repeats until nothing more matches so that removing one pattern
/// cannot splice a new one together.
pub fn sanitize_string(input: &str, options: &TextSanitizeOptions) -> String {
    let mut text = if options.trim {
        input.trim().to_string()
    } else {
        input.to_string()
    };

    if options.strip_dangerous {
        let original_len = text.len();
        loop {
            let mut changed = false;
            for pattern in dangerous_patterns() {
                let replaced = pattern.replace_all(&text, "${1}");
                if replaced != text {
                    text = replaced.into_owned();
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        if text.len() != original_len {
            tracing::debug!(
                removed_bytes = original_len - text.len(),
                "stripped dangerous markup from text field"
            );
            if options.trim {
                text = text.trim().to_string();
            }
        }
    }

    if options.escape_html {
        escape_html(&text)
    } else {
        text
    }
}

fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            '/' => output.push_str("&#x2F;"),
            '`' => output.push_str("&#x60;"),
            '=' => output.push_str("&#x3D;"),
            _ => output.push(c),
        }
    }
    output
}

/// Sanitizes a string value; any other value is returned unchanged.
pub fn sanitize_value(value: &Value, options: &TextSanitizeOptions) -> Value {
    match value {
        Value::String(text) => Value::String(sanitize_string(text, options)),
        other => other.clone(),
    }
}

/// Sanitizes string leaves of a JSON payload.
///
/// Numbers, booleans and nulls pass through, and so does anything nested
/// deeper than `max_depth`.
pub fn sanitize_object(value: &Value, options: &ObjectSanitizeOptions) -> Value {
    walk(value, None, 0, options)
}

/// Sanitizes the given text fields of an entity payload.
pub fn sanitize_payload(payload: &Value, fields: &[&str]) -> Value {
    let options = ObjectSanitizeOptions {
        fields: Some(fields.iter().map(|field| field.to_string()).collect()),
        ..ObjectSanitizeOptions::default()
    };
    sanitize_object(payload, &options)
}

fn walk(value: &Value, key: Option<&str>, depth: usize, options: &ObjectSanitizeOptions) -> Value {
    if depth > options.max_depth {
        return value.clone();
    }
    match value {
        Value::String(text) if is_selected(key, options) => {
            Value::String(sanitize_string(text, &options.text))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| walk(item, key, depth + 1, options))
                .collect(),
        ),
        Value::Object(map) => {
            let mut sanitized = Map::new();
            for (child_key, child) in map {
                let child = if options.exclude.iter().any(|excluded| excluded == child_key) {
                    child.clone()
                } else {
                    walk(child, Some(child_key), depth + 1, options)
                };
                sanitized.insert(child_key.clone(), child);
            }
            Value::Object(sanitized)
        }
        other => other.clone(),
    }
}

fn is_selected(key: Option<&str>, options: &ObjectSanitizeOptions) -> bool {
    match (&options.fields, key) {
        (None, _) => true,
        (Some(fields), Some(key)) => fields.iter().any(|field| field == key),
        (Some(_), None) => false,
    }
}
