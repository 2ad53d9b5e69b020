use crate::error::Result;
use crate::mpd::matchers::{coerce_attribute, Matcher};
use crate::mpd::tree::{RawNode, TypedValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Turns a manifest document into a raw attribute tree.
///
/// Implementations coerce every scalar through `matchers` and keep repeated child
/// elements as sequences. `Ok(None)` means the document held no element at all.
pub trait DocumentReader {
    fn read(&self, data: &str, matchers: &[Matcher]) -> Result<Option<RawNode>>;
}

/// Reads MPD XML. The returned node is the document element itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlReader;

impl DocumentReader for XmlReader {
    fn read(&self, data: &str, matchers: &[Matcher]) -> Result<Option<RawNode>> {
        let mut reader = Reader::from_str(data);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<(String, RawNode)> = Vec::new();
        let mut root: Option<RawNode> = None;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => stack.push(open_element(e, matchers)?),
                Event::Empty(ref e) => {
                    let (name, node) = open_element(e, matchers)?;
                    attach(&mut stack, &mut root, name, node);
                }
                Event::Text(ref t) => {
                    let text = t.unescape()?;
                    append_text(&mut stack, &text);
                }
                Event::CData(ref c) => {
                    let text = std::str::from_utf8(c)?;
                    append_text(&mut stack, text);
                }
                Event::End(_) => {
                    if let Some((name, node)) = stack.pop() {
                        attach(&mut stack, &mut root, name, node);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(root)
    }
}

fn open_element(e: &BytesStart<'_>, matchers: &[Matcher]) -> Result<(String, RawNode)> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut node = RawNode::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?;
        let typed = coerce_attribute(matchers, &key, value.trim());
        node.attributes.insert(key, typed);
    }
    Ok((name, node))
}

fn attach(stack: &mut [(String, RawNode)], root: &mut Option<RawNode>, name: String, node: RawNode) {
    match stack.last_mut() {
        Some((_, parent)) => parent.push_child(&name, node),
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}

fn append_text(stack: &mut [(String, RawNode)], text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if let Some((_, node)) = stack.last_mut() {
        match node.text.as_mut() {
            Some(existing) => existing.push_str(text),
            None => node.text = Some(text.to_string()),
        }
    }
}

/// Reads a manifest that was already converted to JSON, in the usual XML-to-JSON
/// layout: attributes are scalar members, child elements are objects or arrays of
/// objects, and an element holding only text (e.g. `"BaseURL": "http://..."`) is a
/// string member whose name starts with an upper-case letter. `<name>_asArray` members
/// take precedence over their single-valued twin.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReader;

const AS_ARRAY_SUFFIX: &str = "_asArray";
const TEXT_KEY: &str = "__text";

impl DocumentReader for JsonReader {
    fn read(&self, data: &str, matchers: &[Matcher]) -> Result<Option<RawNode>> {
        match serde_json::from_str::<Value>(data)? {
            Value::Object(map) => Ok(Some(object_to_node(&map, matchers))),
            _ => Ok(None),
        }
    }
}

fn object_to_node(map: &Map<String, Value>, matchers: &[Matcher]) -> RawNode {
    let mut node = RawNode::new();
    for (key, value) in map {
        if key == TEXT_KEY {
            node.text = value.as_str().map(str::to_string);
            continue;
        }
        let name = match key.strip_suffix(AS_ARRAY_SUFFIX) {
            Some(stripped) => stripped,
            None if map.contains_key(&format!("{key}{AS_ARRAY_SUFFIX}")) => continue,
            None => key.as_str(),
        };
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(child) = element_from_value(item, matchers) {
                        node.push_child(name, child);
                    }
                }
            }
            Value::Object(_) => {
                if let Some(child) = element_from_value(value, matchers) {
                    node.push_child(name, child);
                }
            }
            Value::String(s) if is_element_name(name) => node.push_child(name, RawNode::new().with_text(s)),
            scalar => {
                if let Some(typed) = scalar_to_value(name, scalar, matchers) {
                    node.attributes.insert(name.to_string(), typed);
                }
            }
        }
    }
    node
}

fn element_from_value(value: &Value, matchers: &[Matcher]) -> Option<RawNode> {
    match value {
        Value::Object(map) => Some(object_to_node(map, matchers)),
        Value::String(s) => Some(RawNode::new().with_text(s)),
        Value::Number(n) => Some(RawNode::new().with_text(&n.to_string())),
        _ => None,
    }
}

fn scalar_to_value(name: &str, value: &Value, matchers: &[Matcher]) -> Option<TypedValue> {
    match value {
        Value::String(s) => Some(coerce_attribute(matchers, name, s.trim())),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(TypedValue::Integer(i)),
            None => n.as_f64().map(TypedValue::Number),
        },
        Value::Bool(b) => Some(TypedValue::String(b.to_string())),
        _ => None,
    }
}

fn is_element_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
