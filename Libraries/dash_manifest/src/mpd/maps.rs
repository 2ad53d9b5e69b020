//! Per-level inheritance rules for the MPD hierarchy.
//!
//! A value declared on a Period or AdaptationSet applies to everything below it unless
//! the descendant declares its own. How the two are combined depends on the property:
//! plain attributes are copied down only when absent, segment information and
//! descriptor elements are merged, and `BaseURL`s are resolved against each other.

use crate::mpd::tree::RawNode;
use url::Url;

/// Element levels taking part in inheritance, root first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Mpd,
    Period,
    AdaptationSet,
    Representation,
    SubRepresentation,
}

impl ElementKind {
    pub fn element_name(self) -> &'static str {
        match self {
            ElementKind::Mpd => "MPD",
            ElementKind::Period => "Period",
            ElementKind::AdaptationSet => "AdaptationSet",
            ElementKind::Representation => "Representation",
            ElementKind::SubRepresentation => "SubRepresentation",
        }
    }

    /// The level directly below this one.
    pub fn child(self) -> Option<ElementKind> {
        match self {
            ElementKind::Mpd => Some(ElementKind::Period),
            ElementKind::Period => Some(ElementKind::AdaptationSet),
            ElementKind::AdaptationSet => Some(ElementKind::Representation),
            ElementKind::Representation => Some(ElementKind::SubRepresentation),
            ElementKind::SubRepresentation => None,
        }
    }
}

/// Whether a rule addresses an XML attribute or a child element sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTarget {
    Attribute,
    Element,
}

/// Resolves an inherited element sequence into the descendant's own one.
pub type ComputeFn = fn(inherited: &[RawNode], own: &mut Vec<RawNode>);

#[derive(Clone, Copy)]
pub enum MergePolicy {
    /// Take the ancestor's value only when the descendant has none.
    CopyDownIfAbsent,
    /// Combine the ancestor's entries with the descendant's. With a `key`, entries are
    /// matched on that attribute and unmatched ancestor entries are appended. Without
    /// one the sequence holds a single element (e.g. `SegmentTemplate`) and the
    /// ancestor's attributes and child elements fill in whatever the descendant lacks.
    MergeAsCollection { key: Option<&'static str> },
    /// Derive the descendant's value from both.
    Computed(ComputeFn),
}

impl std::fmt::Debug for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergePolicy::CopyDownIfAbsent => f.write_str("CopyDownIfAbsent"),
            MergePolicy::MergeAsCollection { key } => f.debug_struct("MergeAsCollection").field("key", key).finish(),
            MergePolicy::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub target: PropertyTarget,
    pub policy: MergePolicy,
}

impl Rule {
    pub const fn attribute(name: &'static str) -> Self {
        Self { name, target: PropertyTarget::Attribute, policy: MergePolicy::CopyDownIfAbsent }
    }

    pub const fn singleton(name: &'static str) -> Self {
        Self { name, target: PropertyTarget::Element, policy: MergePolicy::MergeAsCollection { key: None } }
    }

    pub const fn keyed(name: &'static str, key: &'static str) -> Self {
        Self { name, target: PropertyTarget::Element, policy: MergePolicy::MergeAsCollection { key: Some(key) } }
    }

    pub const fn computed(name: &'static str, compute: ComputeFn) -> Self {
        Self { name, target: PropertyTarget::Element, policy: MergePolicy::Computed(compute) }
    }
}

const BASE_URL: Rule = Rule::computed("BaseURL", resolve_base_urls);

const SEGMENT_VALUES: [Rule; 3] = [
    Rule::singleton("SegmentBase"),
    Rule::singleton("SegmentTemplate"),
    Rule::singleton("SegmentList"),
];

const REPRESENTATION_BASE_VALUES: [Rule; 20] = [
    Rule::attribute("profiles"),
    Rule::attribute("width"),
    Rule::attribute("height"),
    Rule::attribute("sar"),
    Rule::attribute("frameRate"),
    Rule::attribute("audioSamplingRate"),
    Rule::attribute("mimeType"),
    Rule::attribute("segmentProfiles"),
    Rule::attribute("codecs"),
    Rule::attribute("maximumSAPPeriod"),
    Rule::attribute("startWithSAP"),
    Rule::attribute("maxPlayoutRate"),
    Rule::attribute("codingDependency"),
    Rule::attribute("scanType"),
    Rule::keyed("FramePacking", "schemeIdUri"),
    Rule::keyed("AudioChannelConfiguration", "schemeIdUri"),
    Rule::keyed("ContentProtection", "schemeIdUri"),
    Rule::keyed("EssentialProperty", "schemeIdUri"),
    Rule::keyed("SupplementalProperty", "schemeIdUri"),
    Rule::keyed("InbandEventStream", "schemeIdUri"),
];

/// The rule table, keyed by the level that inherits.
#[derive(Debug, Clone)]
pub struct AttributeMaps {
    period: Vec<Rule>,
    adaptation_set: Vec<Rule>,
    representation: Vec<Rule>,
    sub_representation: Vec<Rule>,
}

impl Default for AttributeMaps {
    fn default() -> Self {
        let mut adaptation_set = SEGMENT_VALUES.to_vec();
        adaptation_set.push(BASE_URL);

        let mut representation = SEGMENT_VALUES.to_vec();
        representation.extend_from_slice(&REPRESENTATION_BASE_VALUES);
        representation.push(BASE_URL);

        Self {
            period: vec![BASE_URL],
            adaptation_set,
            representation,
            sub_representation: REPRESENTATION_BASE_VALUES.to_vec(),
        }
    }
}

impl AttributeMaps {
    pub fn rules_for(&self, kind: ElementKind) -> &[Rule] {
        match kind {
            ElementKind::Mpd => &[],
            ElementKind::Period => &self.period,
            ElementKind::AdaptationSet => &self.adaptation_set,
            ElementKind::Representation => &self.representation,
            ElementKind::SubRepresentation => &self.sub_representation,
        }
    }

    /// Every property some level inherits, deduplicated.
    pub fn inherited_properties(&self) -> Vec<(&'static str, PropertyTarget)> {
        let mut names: Vec<(&'static str, PropertyTarget)> = Vec::new();
        for rule in self.period.iter().chain(&self.adaptation_set).chain(&self.representation).chain(&self.sub_representation) {
            if !names.iter().any(|(n, t)| *n == rule.name && *t == rule.target) {
                names.push((rule.name, rule.target));
            }
        }
        names
    }
}

/// Applies `policy` to an element sequence.
pub fn merge_elements(policy: MergePolicy, inherited: &[RawNode], own: &mut Vec<RawNode>) {
    if inherited.is_empty() {
        return;
    }
    match policy {
        MergePolicy::CopyDownIfAbsent => {
            if own.is_empty() {
                own.extend_from_slice(inherited);
            }
        }
        MergePolicy::MergeAsCollection { key: None } => {
            if own.is_empty() {
                own.extend_from_slice(inherited);
                return;
            }
            for node in own.iter_mut() {
                fill_absent(&inherited[0], node);
            }
        }
        MergePolicy::MergeAsCollection { key: Some(key) } => {
            for parent in inherited {
                let matching = own
                    .iter_mut()
                    .find(|child| child.attribute(key).is_some() && child.attribute(key) == parent.attribute(key));
                match matching {
                    Some(child) => fill_absent(parent, child),
                    None => {
                        if !own.contains(parent) {
                            own.push(parent.clone());
                        }
                    }
                }
            }
        }
        MergePolicy::Computed(compute) => compute(inherited, own),
    }
}

/// Copies attributes and child sequences of `parent` that `child` does not declare.
fn fill_absent(parent: &RawNode, child: &mut RawNode) {
    for (name, value) in &parent.attributes {
        if !child.attributes.contains_key(name) {
            child.attributes.insert(name.clone(), value.clone());
        }
    }
    for (name, nodes) in &parent.children {
        if child.children(name).is_empty() {
            child.children.insert(name.clone(), nodes.clone());
        }
    }
    if child.text.is_none() {
        child.text = parent.text.clone();
    }
}

/// `BaseURL` resolution: relative descendant URLs are joined onto the first absolute
/// ancestor URL. Anything that is not a valid absolute URL is left as declared, which
/// keeps the rule idempotent.
fn resolve_base_urls(inherited: &[RawNode], own: &mut Vec<RawNode>) {
    if own.is_empty() {
        own.extend_from_slice(inherited);
        return;
    }
    let Some(base) = inherited.first().and_then(RawNode::text).and_then(|t| Url::parse(t.trim()).ok()) else {
        return;
    };
    for node in own.iter_mut() {
        let Some(text) = node.text() else {
            continue;
        };
        if Url::parse(text.trim()).is_ok() {
            continue;
        }
        if let Ok(joined) = base.join(text.trim()) {
            node.text = Some(joined.to_string());
        }
    }
}
