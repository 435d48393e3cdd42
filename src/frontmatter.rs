//! YAML frontmatter codec.
//!
//! Splits a note into its structured header and raw body text, and joins
//! them back together. Parsing never fails: a note without a leading
//! `---` block decodes to an empty header with the whole text as body, and
//! an undecodable block is reported through [`HeaderState::Malformed`]
//! instead of an error so batch runs keep going.
//!
//! The body is carried byte-for-byte; only the header text is regenerated
//! on [`serialize`], in the mapping's insertion order.

use anyhow::{Context, Result};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

/// Ordered key/value header of a note.
pub type Header = Mapping;

const DELIMITER: &str = "---";

/// How the header block of a note decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderState {
    /// The note has no frontmatter block.
    Absent,
    /// A block was present and decoded to a mapping (possibly empty).
    Parsed,
    /// A block was present but is not a YAML mapping.
    Malformed(String),
}

/// A note split into header and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub header: Header,
    pub body: String,
    pub state: HeaderState,
}

fn frontmatter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)??---[ \t]*(?:\r?\n|\z)(.*)\z")
            .expect("frontmatter pattern is valid")
    })
}

/// Split `text` into header and body.
pub fn parse(text: &str) -> Frontmatter {
    let Some(captures) = frontmatter_pattern().captures(text) else {
        return Frontmatter {
            header: Header::new(),
            body: text.to_string(),
            state: HeaderState::Absent,
        };
    };

    let block = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let body = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let (header, state) = decode_block(block);
    Frontmatter {
        header,
        body,
        state,
    }
}

fn decode_block(block: &str) -> (Header, HeaderState) {
    if block.trim().is_empty() {
        return (Header::new(), HeaderState::Parsed);
    }

    match serde_yaml::from_str::<Value>(block) {
        Ok(Value::Mapping(map)) => (map, HeaderState::Parsed),
        Ok(Value::Null) => (Header::new(), HeaderState::Parsed),
        Ok(other) => (
            Header::new(),
            HeaderState::Malformed(format!(
                "frontmatter is a {}, not a mapping",
                value_kind(&other)
            )),
        ),
        Err(e) => (Header::new(), HeaderState::Malformed(e.to_string())),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Join a header and body back into note text.
///
/// Emits the delimiter, the header in block style, the closing delimiter,
/// then `body` unchanged.
pub fn serialize(header: &Header, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(header).context("Failed to encode frontmatter")?;

    let mut out = String::with_capacity(yaml.len() + body.len() + 8);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(body);
    Ok(out)
}
