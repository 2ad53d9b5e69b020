//! DASH manifest data structures (MPD and related types).
//!
//! The normalized manifest is an arena: the [`Manifest`] owns every Period,
//! AdaptationSet and Representation in flat vectors and children point at their parent
//! through typed ids. Walking up the hierarchy (a representation's period start, the
//! manifest's `maxSegmentDuration`) is an index lookup, see [`RepresentationRef`].

pub mod maps;
pub mod matchers;
pub mod normalizer;
pub mod parser;
pub mod reader;
pub mod tree;

use crate::segment::Segment;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PeriodId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct AdaptationSetId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RepresentationId(pub usize);

/// `MPD@type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestType {
    #[default]
    Static,
    Dynamic,
}

/// A time range in seconds on the MPD timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// How the segments of a representation are addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AddressingMode {
    /// A single segment covering the whole period (`SegmentBase` or a bare `BaseURL`).
    Base,
    /// Explicit `SegmentURL`s of fixed duration.
    List,
    /// `SegmentTemplate` with `@duration`: fixed-duration index addressing.
    Template,
    /// `SegmentTimeline` inside a template or list: explicit per-segment times.
    Timeline,
}

/// One `S` element of a `SegmentTimeline`, in timescale units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub t: Option<u64>,
    pub d: u64,
    /// Repeat count; negative repeats until the next `@t` or the period end.
    pub r: i64,
}

/// One `SegmentURL` of a `SegmentList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentUrl {
    pub media: Option<String>,
    pub media_range: Option<String>,
}

/// Top-level metadata of a normalized MPD.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub manifest_type: ManifestType,
    /// Anchor of the live timeline. Absent on most static manifests.
    pub availability_start_time: Option<DateTime<Utc>>,
    pub availability_end_time: Option<DateTime<Utc>>,
    pub publish_time: Option<DateTime<Utc>>,
    pub media_presentation_duration: Option<f64>,
    pub min_buffer_time: f64,
    /// Upper bound for any segment duration. `f64::INFINITY` when not declared.
    pub max_segment_duration: f64,
    pub suggested_presentation_delay: f64,
    /// Depth of the live window. `f64::INFINITY` when not declared.
    pub time_shift_buffer_depth: f64,
    pub minimum_update_period: Option<f64>,
    /// Wall-clock time at which this manifest was loaded.
    pub loaded_time: DateTime<Utc>,
    pub base_url: Option<String>,
    pub profiles: Option<String>,
    pub periods: Vec<Period>,
    pub adaptation_sets: Vec<AdaptationSet>,
    pub representations: Vec<Representation>,
}

#[derive(Debug, Clone)]
pub struct Period {
    pub id: Option<String>,
    pub index: usize,
    /// Start on the MPD timeline, in seconds.
    pub start: f64,
    /// Duration in seconds, `f64::INFINITY` for an open-ended live period.
    pub duration: f64,
    pub base_url: Option<String>,
    pub adaptation_sets: Vec<AdaptationSetId>,
}

/// An adaptation set groups representations with the same content type (e.g., audio or video).
#[derive(Debug, Clone)]
pub struct AdaptationSet {
    pub id: Option<String>,
    pub index: usize,
    pub period: PeriodId,
    pub mime_type: Option<String>,
    pub content_type: Option<String>,
    pub lang: Option<String>,
    pub representations: Vec<RepresentationId>,
}

/// A single video/audio representation within an adaptation set.
#[derive(Debug, Clone)]
pub struct Representation {
    pub id: Option<String>,
    pub index: usize,
    pub adaptation: AdaptationSetId,
    /// Average bandwidth in bits per second.
    pub bandwidth: u64,
    pub codecs: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    /// Units per second of every timing attribute in the segment information.
    pub timescale: u64,
    /// `@duration / @timescale`, when declared.
    pub segment_duration: Option<f64>,
    pub start_number: u64,
    /// `@presentationTimeOffset / @timescale`.
    pub presentation_time_offset: f64,
    /// Media URL template (may contain $Number$, $Time$, etc.).
    pub media: Option<String>,
    /// Initialization URL with `$RepresentationID$` already substituted.
    pub initialization: Option<String>,
    pub index_range: Option<String>,
    pub segment_timeline: Option<Vec<TimelineEntry>>,
    pub segment_list: Vec<SegmentUrl>,
    pub addressing: AddressingMode,
    pub base_url: Option<String>,
    /// Segments built so far. Replaced wholesale, never edited in place.
    pub segments: Option<Arc<Vec<Segment>>>,
    pub segment_availability_range: Option<TimeRange>,
}

impl Representation {
    /// A copy of this representation carrying a freshly built segment sequence.
    pub fn with_segments(&self, segments: Vec<Segment>) -> Representation {
        Representation { segments: Some(Arc::new(segments)), ..self.clone() }
    }

    pub fn with_availability_range(&self, range: TimeRange) -> Representation {
        Representation { segment_availability_range: Some(range), ..self.clone() }
    }

    pub fn segments(&self) -> Option<&[Segment]> {
        self.segments.as_deref().map(Vec::as_slice)
    }
}

impl Manifest {
    pub fn is_dynamic(&self) -> bool {
        self.manifest_type == ManifestType::Dynamic
    }

    pub fn period(&self, id: PeriodId) -> Option<&Period> {
        self.periods.get(id.0)
    }

    pub fn adaptation_set(&self, id: AdaptationSetId) -> Option<&AdaptationSet> {
        self.adaptation_sets.get(id.0)
    }

    pub fn representation(&self, id: RepresentationId) -> Option<&Representation> {
        self.representations.get(id.0)
    }

    pub fn representation_ref(&self, id: RepresentationId) -> Option<RepresentationRef<'_>> {
        self.representations.get(id.0).map(|_| RepresentationRef { manifest: self, id })
    }

    /// Looks a representation up by its `@id`.
    pub fn find_representation(&self, id: &str) -> Option<RepresentationRef<'_>> {
        self.representations
            .iter()
            .position(|r| r.id.as_deref() == Some(id))
            .map(|i| RepresentationRef { manifest: self, id: RepresentationId(i) })
    }

    pub fn representation_ids(&self) -> impl Iterator<Item = RepresentationId> + '_ {
        (0..self.representations.len()).map(RepresentationId)
    }

    /// Swaps one representation for `replacement`. Used on a private copy of a
    /// snapshot, see [`crate::store::ManifestStore`].
    pub(crate) fn set_representation(&mut self, id: RepresentationId, replacement: Representation) -> bool {
        match self.representations.get_mut(id.0) {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        }
    }
}

/// A representation together with the manifest that owns it.
///
/// Only handed out by [`Manifest`] after checking the id, so the parent lookups below
/// always resolve.
#[derive(Debug, Clone, Copy)]
pub struct RepresentationRef<'a> {
    manifest: &'a Manifest,
    id: RepresentationId,
}

impl<'a> RepresentationRef<'a> {
    pub fn id(&self) -> RepresentationId {
        self.id
    }

    pub fn manifest(&self) -> &'a Manifest {
        self.manifest
    }

    pub fn representation(&self) -> &'a Representation {
        &self.manifest.representations[self.id.0]
    }

    pub fn adaptation(&self) -> &'a AdaptationSet {
        &self.manifest.adaptation_sets[self.representation().adaptation.0]
    }

    pub fn period(&self) -> &'a Period {
        &self.manifest.periods[self.adaptation().period.0]
    }
}
