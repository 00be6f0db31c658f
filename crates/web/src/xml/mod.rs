//! Structural json to xml conversion.
//!
//! Mapping keys become element names and scalars become escaped text. Entries of a sequence
//! are named after the singular of the key holding the sequence:
//!
//! ```
//! use serde_json::json;
//!
//! let xml = metal_web::xml::to_xml(&json!({"messages": ["a", "b"]}), "response", false);
//! assert_eq!(xml, "<response><messages><message>a</message><message>b</message></messages></response>");
//! ```

mod inflector;

use serde_json::Value;

pub use inflector::singularize;

pub const DEFAULT_ROOT: &str = "response";

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Converts `value` into an xml document whose root element is `root`.
///
/// An empty `root` falls back to [`DEFAULT_ROOT`]. With `declaration`, the document starts
/// with [`XML_DECLARATION`] on its own line.
pub fn to_xml(value: &Value, root: &str, declaration: bool) -> String {
    let root = if root.is_empty() { DEFAULT_ROOT } else { root };
    let mut out = String::new();

    if declaration {
        out.push_str(XML_DECLARATION);
        out.push('\n');
    }

    write_node(&mut out, &element_name(root), value, root);
    out
}

/// Parses `json` and converts it with [`to_xml`].
pub fn from_json_str(json: &str, root: &str, declaration: bool) -> Result<String, serde_json::Error> {
    let value = serde_json::from_str::<Value>(json)?;
    Ok(to_xml(&value, root, declaration))
}

/// Writes `<name>…</name>`; `parent` names the entries of `value` when it is a sequence.
fn write_node(out: &mut String, name: &str, value: &Value, parent: &str) {
    match value {
        Value::Array(items) if items.is_empty() => empty_element(out, name),
        Value::Object(map) if map.is_empty() => empty_element(out, name),
        Value::Array(items) => {
            open(out, name);
            let item_name = element_name(&singularize(parent));
            for item in items {
                write_node(out, &item_name, item, parent);
            }
            close(out, name);
        }
        Value::Object(map) => {
            open(out, name);
            for (key, child) in map {
                if is_numeric_key(key) {
                    write_node(out, &element_name(&singularize(parent)), child, parent);
                } else {
                    write_node(out, &element_name(key), child, key);
                }
            }
            close(out, name);
        }
        scalar => {
            open(out, name);
            out.push_str(&escape(&scalar_text(scalar)));
            close(out, name);
        }
    }
}

fn open(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn empty_element(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push_str("/>");
}

/// `true` is `1`; `false` and `null` are empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Keeps letters, digits, `_`, `-` and `.`; anything else becomes `_`. Names that cannot
/// start an element are prefixed with `_`.
fn element_name(key: &str) -> String {
    let mut name = key
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect::<String>();

    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}
