//! Minimal XML property-list writer.
//!
//! Documents are built as a typed [`Value`] tree and serialised in one pass;
//! every string goes through [`escape`], which rejects characters XML 1.0
//! cannot represent.

use std::fmt::Write as _;

use super::ArtifactError;

const HEADER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">"#,
    "\n",
);

/// A property-list value. Dictionaries keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Integer(i64),
    Bool(bool),
    Array(Vec<Value>),
    Dict(Dict),
}

/// An ordered dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict(Vec<(String, Value)>);

impl Dict {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.push((key.to_string(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Self::Dict(d)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Serialise a complete plist document with `root` as its top-level value.
pub fn to_xml(root: &Value) -> Result<String, ArtifactError> {
    let mut out = String::with_capacity(4096);
    out.push_str(HEADER);
    out.push_str("<plist version=\"1.0\">\n");
    write_value(&mut out, root, 0)?;
    out.push_str("</plist>\n");
    Ok(out)
}

fn write_value(out: &mut String, value: &Value, depth: usize) -> Result<(), ArtifactError> {
    indent(out, depth);
    match value {
        Value::String(s) => {
            let _ = writeln!(out, "<string>{}</string>", escape(s)?);
        }
        Value::Integer(n) => {
            let _ = writeln!(out, "<integer>{n}</integer>");
        }
        Value::Bool(true) => out.push_str("<true/>\n"),
        Value::Bool(false) => out.push_str("<false/>\n"),
        Value::Array(items) if items.is_empty() => out.push_str("<array/>\n"),
        Value::Array(items) => {
            out.push_str("<array>\n");
            for item in items {
                write_value(out, item, depth + 1)?;
            }
            indent(out, depth);
            out.push_str("</array>\n");
        }
        Value::Dict(dict) => {
            out.push_str("<dict>\n");
            for (key, item) in &dict.0 {
                indent(out, depth + 1);
                let _ = writeln!(out, "<key>{}</key>", escape(key)?);
                write_value(out, item, depth + 1)?;
            }
            indent(out, depth);
            out.push_str("</dict>\n");
        }
    }
    Ok(())
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Escape markup characters; reject characters XML 1.0 forbids.
pub fn escape(s: &str) -> Result<String, ArtifactError> {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                return Err(ArtifactError::UnrepresentableCharacter(u32::from(c)));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}
