//! Applies the [`AttributeMaps`] to a raw tree.
//!
//! The walk goes root to leaf. Before descending into a node's children the properties
//! any rule may ask for are captured into a scope, so a child resolves "nearest ancestor
//! that defines it" by searching the scope stack from the top.

use crate::error::{ParseError, Result};
use crate::mpd::maps::{merge_elements, AttributeMaps, ElementKind, PropertyTarget, Rule};
use crate::mpd::tree::{RawNode, TypedValue};
use tracing::{debug, trace};

enum Captured {
    Value(TypedValue),
    Elements(Vec<RawNode>),
}

type Scope = Vec<(&'static str, PropertyTarget, Captured)>;

/// Normalizes a copy of `root` and returns it. `root` itself is never touched, so a
/// failed pass leaves nothing half-applied.
pub fn normalize(maps: &AttributeMaps, root: &RawNode) -> Result<RawNode> {
    if root.children(ElementKind::Period.element_name()).is_empty() {
        return Err(ParseError::normalization("manifest has no Period"));
    }

    let properties = maps.inherited_properties();
    let mut tree = root.clone();
    let mut scopes: Vec<Scope> = Vec::new();
    let applied = walk(maps, &properties, ElementKind::Mpd, &mut tree, &mut scopes);
    debug!("Normalization applied {} inherited properties", applied);
    Ok(tree)
}

fn walk(
    maps: &AttributeMaps,
    properties: &[(&'static str, PropertyTarget)],
    kind: ElementKind,
    node: &mut RawNode,
    scopes: &mut Vec<Scope>,
) -> usize {
    let mut applied = 0;
    for rule in maps.rules_for(kind) {
        if apply_rule(rule, node, scopes) {
            trace!(element = kind.element_name(), property = rule.name, "inherited");
            applied += 1;
        }
    }

    let Some(child_kind) = kind.child() else {
        return applied;
    };
    scopes.push(capture(node, properties));
    if let Some(children) = node.children.get_mut(child_kind.element_name()) {
        for child in children.iter_mut() {
            applied += walk(maps, properties, child_kind, child, scopes);
        }
    }
    scopes.pop();
    applied
}

fn capture(node: &RawNode, properties: &[(&'static str, PropertyTarget)]) -> Scope {
    properties
        .iter()
        .filter_map(|&(name, target)| {
            let captured = match target {
                PropertyTarget::Attribute => node.attribute(name).cloned().map(Captured::Value),
                PropertyTarget::Element => {
                    let elements = node.children(name);
                    (!elements.is_empty()).then(|| Captured::Elements(elements.to_vec()))
                }
            };
            captured.map(|c| (name, target, c))
        })
        .collect()
}

fn nearest<'s>(scopes: &'s [Scope], rule: &Rule) -> Option<&'s Captured> {
    scopes
        .iter()
        .rev()
        .find_map(|scope| scope.iter().find(|(name, target, _)| *name == rule.name && *target == rule.target))
        .map(|(_, _, captured)| captured)
}

/// Returns whether the node changed.
fn apply_rule(rule: &Rule, node: &mut RawNode, scopes: &[Scope]) -> bool {
    match (rule.target, nearest(scopes, rule)) {
        (PropertyTarget::Attribute, Some(Captured::Value(value))) => {
            if node.attributes.contains_key(rule.name) {
                return false;
            }
            node.attributes.insert(rule.name.to_string(), value.clone());
            true
        }
        (PropertyTarget::Element, Some(Captured::Elements(inherited))) => {
            let own = node.children.entry(rule.name.to_string()).or_default();
            let before = own.clone();
            merge_elements(rule.policy, inherited, own);
            let changed = *own != before;
            if own.is_empty() {
                node.children.shift_remove(rule.name);
            }
            changed
        }
        _ => false,
    }
}
