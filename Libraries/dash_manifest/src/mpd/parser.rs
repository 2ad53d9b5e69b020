use crate::error::{ParseError, Result};
use crate::mpd::maps::AttributeMaps;
use crate::mpd::matchers::Matcher;
use crate::mpd::normalizer::normalize;
use crate::mpd::reader::{DocumentReader, JsonReader, XmlReader};
use crate::mpd::tree::{RawNode, TypedValue};
use crate::mpd::{
    AdaptationSet, AdaptationSetId, AddressingMode, Manifest, ManifestType, Period, PeriodId, Representation,
    RepresentationId, SegmentUrl, TimelineEntry,
};
use crate::segment::template::replace_id_for_template;
use crate::timeline::{system_clock, Clock};
use std::time::Instant;
use tracing::{debug, info};

/// Turns manifest documents into normalized [`Manifest`]s.
#[derive(Clone)]
pub struct DashParser {
    matchers: Vec<Matcher>,
    attribute_maps: AttributeMaps,
    clock: Clock,
}

impl std::fmt::Debug for DashParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashParser")
            .field("matchers", &self.matchers)
            .field("attribute_maps", &self.attribute_maps)
            .finish_non_exhaustive()
    }
}

impl Default for DashParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DashParser {
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// A parser stamping `loaded_time` from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self { matchers: Matcher::PRIORITY.to_vec(), attribute_maps: AttributeMaps::default(), clock }
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn attribute_maps(&self) -> &AttributeMaps {
        &self.attribute_maps
    }

    /// Parses an MPD XML document.
    pub fn parse(&self, data: &str) -> Result<Manifest> {
        self.parse_with(&XmlReader, data, |_| {})
    }

    /// Parses a manifest that was already converted to JSON. The root `BaseURL` is
    /// reduced to its first entry and made absolute-looking.
    pub fn parse_json(&self, data: &str) -> Result<Manifest> {
        self.parse_with(&JsonReader, data, normalize_root_base_url)
    }

    /// Parses with a caller-supplied reader.
    pub fn parse_with_reader(&self, reader: &dyn DocumentReader, data: &str) -> Result<Manifest> {
        self.parse_with(reader, data, |_| {})
    }

    fn parse_with(&self, reader: &dyn DocumentReader, data: &str, prepare: impl FnOnce(&mut RawNode)) -> Result<Manifest> {
        let start = Instant::now();
        let mut root = reader
            .read(data, &self.matchers)?
            .ok_or_else(|| ParseError::document_read("parsing the manifest failed"))?;
        prepare(&mut root);
        let read_time = start.elapsed();

        let manifest = self.parse_tree(&root)?;
        let total = start.elapsed();
        info!(
            "Parsing complete: (read: {:.3}ms, normalize: {:.3}ms, total: {:.3}s)",
            read_time.as_secs_f64() * 1000.0,
            (total - read_time).as_secs_f64() * 1000.0,
            total.as_secs_f64()
        );
        Ok(manifest)
    }

    /// Normalizes a raw tree and builds the typed graph from it.
    pub fn parse_tree(&self, root: &RawNode) -> Result<Manifest> {
        let tree = normalize(&self.attribute_maps, root)?;
        build_manifest(&tree, (self.clock)())
    }
}

fn normalize_root_base_url(root: &mut RawNode) {
    let Some(first) = root.children.get("BaseURL").and_then(|urls| urls.first()).cloned() else {
        return;
    };
    let mut url = first.text().unwrap_or_default().trim().to_string();
    if url.starts_with("www") {
        url = format!("http://{}", url);
    }
    if !url.ends_with('/') {
        url.push('/');
    }
    root.children.insert("BaseURL".to_string(), vec![first.with_text(&url)]);
}

fn first_base_url(node: &RawNode) -> Option<String> {
    node.first_child("BaseURL").and_then(RawNode::text).map(|t| t.trim().to_string())
}

fn build_manifest(mpd: &RawNode, loaded_time: chrono::DateTime<chrono::Utc>) -> Result<Manifest> {
    let manifest_type = match mpd.attribute("type").and_then(TypedValue::as_str) {
        Some("dynamic") => ManifestType::Dynamic,
        _ => ManifestType::Static,
    };
    let media_presentation_duration = mpd.number("mediaPresentationDuration");

    let mut manifest = Manifest {
        manifest_type,
        availability_start_time: mpd.date_time("availabilityStartTime"),
        availability_end_time: mpd.date_time("availabilityEndTime"),
        publish_time: mpd.date_time("publishTime"),
        media_presentation_duration,
        min_buffer_time: mpd.number("minBufferTime").unwrap_or(0.0),
        max_segment_duration: mpd.number("maxSegmentDuration").unwrap_or(f64::INFINITY),
        suggested_presentation_delay: mpd.number("suggestedPresentationDelay").unwrap_or(0.0),
        time_shift_buffer_depth: mpd.number("timeShiftBufferDepth").unwrap_or(f64::INFINITY),
        minimum_update_period: mpd.number("minimumUpdatePeriod"),
        loaded_time,
        base_url: first_base_url(mpd),
        profiles: mpd.text_attribute("profiles"),
        periods: Vec::new(),
        adaptation_sets: Vec::new(),
        representations: Vec::new(),
    };

    let period_nodes = mpd.children("Period");
    let starts = period_starts(period_nodes)?;

    for (index, node) in period_nodes.iter().enumerate() {
        let start = starts[index];
        let duration = node
            .number("duration")
            .or_else(|| starts.get(index + 1).map(|next| next - start))
            .or_else(|| media_presentation_duration.map(|total| total - start))
            .unwrap_or(f64::INFINITY);

        let period_id = PeriodId(manifest.periods.len());
        manifest.periods.push(Period {
            id: node.text_attribute("id"),
            index,
            start,
            duration,
            base_url: first_base_url(node),
            adaptation_sets: Vec::new(),
        });

        for (as_index, as_node) in node.children("AdaptationSet").iter().enumerate() {
            let adaptation_id = AdaptationSetId(manifest.adaptation_sets.len());
            manifest.adaptation_sets.push(AdaptationSet {
                id: as_node.text_attribute("id"),
                index: as_index,
                period: period_id,
                mime_type: as_node.text_attribute("mimeType"),
                content_type: as_node.text_attribute("contentType"),
                lang: as_node.text_attribute("lang"),
                representations: Vec::new(),
            });
            manifest.periods[period_id.0].adaptation_sets.push(adaptation_id);

            for (rep_index, rep_node) in as_node.children("Representation").iter().enumerate() {
                let representation_id = RepresentationId(manifest.representations.len());
                manifest.representations.push(build_representation(rep_node, rep_index, adaptation_id));
                manifest.adaptation_sets[adaptation_id.0].representations.push(representation_id);
            }
        }
    }

    debug!(
        "Built manifest: {} periods, {} adaptation sets, {} representations",
        manifest.periods.len(),
        manifest.adaptation_sets.len(),
        manifest.representations.len()
    );
    Ok(manifest)
}

/// Period starts on the MPD timeline: `@start`, else the end of the previous period
/// when it declares a duration, else 0 for the first period.
fn period_starts(periods: &[RawNode]) -> Result<Vec<f64>> {
    let mut starts: Vec<f64> = Vec::with_capacity(periods.len());
    for (index, node) in periods.iter().enumerate() {
        let start = match node.number("start") {
            Some(start) => start,
            None if index == 0 => 0.0,
            None => {
                let previous = &periods[index - 1];
                match previous.number("duration") {
                    Some(duration) => starts[index - 1] + duration,
                    None => {
                        return Err(ParseError::normalization(format!(
                            "start of period {} cannot be resolved",
                            index
                        )))
                    }
                }
            }
        };
        starts.push(start);
    }
    Ok(starts)
}

/// Segment information in order of precedence.
const SEGMENT_INFO: [&str; 3] = ["SegmentBase", "SegmentList", "SegmentTemplate"];

fn build_representation(node: &RawNode, index: usize, adaptation: AdaptationSetId) -> Representation {
    let id = node.text_attribute("id");
    let info = SEGMENT_INFO.iter().find_map(|name| node.first_child(name).map(|info| (*name, info)));

    let mut rep = Representation {
        id,
        index,
        adaptation,
        bandwidth: node.unsigned("bandwidth").unwrap_or(0),
        codecs: node.text_attribute("codecs"),
        mime_type: node.text_attribute("mimeType"),
        width: node.unsigned("width"),
        height: node.unsigned("height"),
        timescale: 1,
        segment_duration: None,
        start_number: 1,
        presentation_time_offset: 0.0,
        media: None,
        initialization: None,
        index_range: None,
        segment_timeline: None,
        segment_list: Vec::new(),
        addressing: AddressingMode::Base,
        base_url: first_base_url(node),
        segments: None,
        segment_availability_range: None,
    };

    let Some((kind, info)) = info else {
        return rep;
    };

    rep.timescale = info.unsigned("timescale").filter(|ts| *ts > 0).unwrap_or(1);
    let timescale = rep.timescale as f64;
    rep.segment_duration = info.number("duration").map(|d| d / timescale);
    rep.start_number = info.unsigned("startNumber").unwrap_or(1);
    rep.presentation_time_offset = info.number("presentationTimeOffset").unwrap_or(0.0) / timescale;
    rep.index_range = info.text_attribute("indexRange");
    rep.media = info.text_attribute("media");

    let initialization = info
        .text_attribute("initialization")
        .or_else(|| info.first_child("Initialization").and_then(|init| init.text_attribute("sourceURL")));
    rep.initialization = initialization.map(|url| replace_id_for_template(&url, rep.id.as_deref()));

    rep.segment_timeline = info.first_child("SegmentTimeline").map(|timeline| {
        timeline
            .children("S")
            .iter()
            .map(|s| TimelineEntry {
                t: s.unsigned("t"),
                d: s.unsigned("d").unwrap_or(0),
                r: match s.attribute("r") {
                    Some(TypedValue::Integer(r)) => *r,
                    Some(other) => other.as_f64().map(|r| r as i64).unwrap_or(0),
                    None => 0,
                },
            })
            .collect()
    });

    rep.segment_list = info
        .children("SegmentURL")
        .iter()
        .map(|url| SegmentUrl { media: url.text_attribute("media"), media_range: url.text_attribute("mediaRange") })
        .collect();

    rep.addressing = match (kind, rep.segment_timeline.is_some()) {
        (_, true) => AddressingMode::Timeline,
        ("SegmentTemplate", false) => AddressingMode::Template,
        ("SegmentList", false) => AddressingMode::List,
        _ => AddressingMode::Base,
    };
    rep
}
