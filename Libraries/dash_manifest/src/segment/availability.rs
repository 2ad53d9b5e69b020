//! Which segment indices of a templated representation may be requested right now.

use crate::mpd::{RepresentationRef, TimeRange};
use crate::segment::get_segment_by_index;
use crate::timeline::TimelineConverter;
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

/// Inclusive range of segment indices. Both bounds are NaN when nothing can be said
/// about the representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentRange {
    pub start: f64,
    pub end: f64,
}

impl SegmentRange {
    pub fn unavailable() -> Self {
        Self { start: f64::NAN, end: f64::NAN }
    }

    pub fn is_available(&self) -> bool {
        !self.start.is_nan() && !self.end.is_nan()
    }

    /// The indices covered by the range, clamped at 0. Empty for NaN, infinite or
    /// inverted bounds.
    pub fn indices(&self) -> RangeInclusive<usize> {
        if !self.is_available() || !self.start.is_finite() || !self.end.is_finite() || self.end < 0.0 {
            return RangeInclusive::new(1, 0);
        }
        self.start.max(0.0) as usize..=self.end as usize
    }
}

// f64::max/min drop a NaN operand; the range arithmetic needs it to spread.
fn max_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn min_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

/// Computes the index range to build for a duration-based template.
///
/// `requested_time` is on the MPD timeline and only matters when segments were built
/// before but none sits at `index`. `given_upper_limit` (seconds) overrides the default
/// look-ahead of `max(2 * minBufferTime, 10 * duration)`; zero or NaN count as absent.
pub fn decide_segment_list_range_for_template(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: Option<RepresentationRef<'_>>,
    requested_time: f64,
    index: usize,
    given_upper_limit: Option<f64>,
) -> SegmentRange {
    let Some(representation) = representation else {
        return SegmentRange::unavailable();
    };
    let window = representation.representation().segment_availability_range;
    decide_segment_list_range_in_window(converter, is_dynamic, representation, window, requested_time, index, given_upper_limit)
}

/// [`decide_segment_list_range_for_template`] against an explicit availability window
/// instead of the one stored on the representation.
pub fn decide_segment_list_range_in_window(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    window: Option<TimeRange>,
    requested_time: f64,
    index: usize,
    given_upper_limit: Option<f64>,
) -> SegmentRange {
    let rep = representation.representation();
    let duration = rep.segment_duration.unwrap_or(f64::NAN);
    let min_buffer_time = representation.manifest().min_buffer_time;

    let (window_start, window_end) = match window {
        Some(range) => (range.start, range.end),
        None => (f64::NAN, f64::NAN),
    };
    let relative_start = max_nan(converter.calc_period_relative_time_from_mpd_relative_time(representation, window_start), 0.0);
    let relative_end = converter.calc_period_relative_time_from_mpd_relative_time(representation, window_end);

    if is_dynamic && !converter.is_time_sync_completed() {
        let range = SegmentRange {
            start: (relative_start / duration).floor(),
            end: (relative_end / duration).floor(),
        };
        if range.end < range.start {
            warn!("Availability window of representation {:?} is inverted: {:?}", rep.id, range);
        }
        return range;
    }

    let lower_limit = 2.0 * duration;
    let upper_limit = given_upper_limit
        .filter(|limit| *limit != 0.0 && !limit.is_nan())
        .unwrap_or_else(|| max_nan(2.0 * min_buffer_time, 10.0 * duration));

    let has_segments = rep.segments().is_some_and(|segments| !segments.is_empty());
    let origin = if has_segments {
        match get_segment_by_index(index, Some(rep)) {
            Some(seg) => converter.calc_period_relative_time_from_mpd_relative_time(representation, seg.presentation_start_time),
            None if index > 0 => index as f64 * duration,
            None => converter.calc_period_relative_time_from_mpd_relative_time(representation, requested_time),
        }
    } else if index > 0 {
        index as f64 * duration
    } else if is_dynamic {
        relative_end
    } else {
        relative_start
    };

    let start = (max_nan(origin - lower_limit, relative_start) / duration).floor();
    let end = min_nan(start + upper_limit / duration, relative_end / duration).floor();

    debug!("Segment range for representation {:?}: [{}, {}] around origin {}", rep.id, start, end, origin);
    SegmentRange { start, end }
}
