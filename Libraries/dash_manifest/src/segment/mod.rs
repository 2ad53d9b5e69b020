//! Segment descriptors and the code that derives them from a normalized manifest.

pub mod availability;
pub mod builder;
pub mod getters;
pub mod template;

use crate::mpd::{Representation, RepresentationId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One addressable media fragment of a representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub representation: RepresentationId,
    /// Duration in seconds.
    pub duration: f64,
    /// Start on the MPD timeline, in seconds.
    pub presentation_start_time: f64,
    /// Start on the media timeline, in seconds.
    pub media_start_time: f64,
    pub availability_start_time: Option<DateTime<Utc>>,
    pub availability_end_time: Option<DateTime<Utc>>,
    pub wall_start_time: Option<DateTime<Utc>>,
    /// Value substituted for `$Number$`.
    pub replacement_number: u64,
    /// Value substituted for `$Time$`, in timescale units.
    pub replacement_time: Option<u64>,
    /// Position of the segment in the representation's segment sequence.
    pub availability_idx: usize,
    /// Resolved request URL, relative to the representation's BaseURL.
    pub media: Option<String>,
    /// Byte range within `media`.
    pub media_range: Option<String>,
}

impl Segment {
    pub fn presentation_end_time(&self) -> f64 {
        self.presentation_start_time + self.duration
    }
}

/// Finds the segment whose `availability_idx` is `index`.
///
/// After a live refresh the sequence may no longer line up with positions, so the
/// direct lookup falls back to a scan. `None` means "not currently available".
pub fn get_segment_by_index(index: usize, representation: Option<&Representation>) -> Option<&Segment> {
    let segments = representation?.segments()?;

    if let Some(seg) = segments.get(index) {
        if seg.availability_idx == index {
            return Some(seg);
        }
    }

    segments.iter().find(|seg| seg.availability_idx == index)
}
