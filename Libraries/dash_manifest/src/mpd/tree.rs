//! The raw attribute tree produced by a document reader.
//!
//! Every element becomes a [`RawNode`]. Attributes are already coerced into
//! [`TypedValue`]s by the matchers, and repeated child elements are kept as ordered
//! sequences keyed by element name, so `Period` is always a `Vec` even when the document
//! holds a single one.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use std::fmt;

/// A scalar attribute value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// ISO-8601 duration, in seconds.
    Duration(f64),
    DateTime(DateTime<Utc>),
    /// Integral numeric literal. Kept exact so 64-bit media times survive.
    Integer(i64),
    Number(f64),
    String(String),
}

impl TypedValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Duration(v) | TypedValue::Number(v) => Some(*v),
            TypedValue::Integer(v) => Some(*v as f64),
            TypedValue::DateTime(_) | TypedValue::String(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            TypedValue::Integer(v) => u64::try_from(*v).ok(),
            TypedValue::Number(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            TypedValue::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Duration(v) => write!(f, "PT{}S", v),
            TypedValue::DateTime(v) => write!(f, "{}", v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            TypedValue::Integer(v) => write!(f, "{}", v),
            TypedValue::Number(v) => write!(f, "{}", v),
            TypedValue::String(v) => f.write_str(v),
        }
    }
}

/// One element of the manifest document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    pub attributes: IndexMap<String, TypedValue>,
    pub children: IndexMap<String, Vec<RawNode>>,
    /// Character data directly inside the element (e.g. the URL of a `BaseURL`).
    pub text: Option<String>,
}

impl RawNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: TypedValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn with_child(mut self, name: &str, child: RawNode) -> Self {
        self.push_child(name, child);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn push_child(&mut self, name: &str, child: RawNode) {
        self.children.entry(name.to_string()).or_default().push(child);
    }

    pub fn attribute(&self, name: &str) -> Option<&TypedValue> {
        self.attributes.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(TypedValue::as_f64)
    }

    pub fn unsigned(&self, name: &str) -> Option<u64> {
        self.attribute(name).and_then(TypedValue::as_u64)
    }

    pub fn date_time(&self, name: &str) -> Option<DateTime<Utc>> {
        self.attribute(name).and_then(TypedValue::as_date_time)
    }

    /// Any attribute rendered back to text. Identifier-like attributes are always
    /// strings already, this also covers numeric ids coming from JSON input.
    pub fn text_attribute(&self, name: &str) -> Option<String> {
        self.attribute(name).map(|v| v.to_string())
    }

    pub fn children(&self, name: &str) -> &[RawNode] {
        self.children.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_child(&self, name: &str) -> Option<&RawNode> {
        self.children(name).first()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
