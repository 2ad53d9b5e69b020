//! Builds the segment sequence of a representation for each addressing mode.

use crate::mpd::{AddressingMode, Representation, RepresentationRef, TimeRange};
use crate::segment::availability::decide_segment_list_range_in_window;
use crate::segment::builder::{get_index_based_segment, get_time_based_segment, SegmentTiming};
use crate::segment::template::{resolve_segment_url, TemplateValues};
use crate::segment::Segment;
use crate::timeline::TimelineConverter;
use tracing::{debug, warn};

/// What the caller is about to play, used to center the live look-ahead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentRequest {
    /// Position on the MPD timeline, in seconds.
    pub requested_time: f64,
    /// Index of the segment the caller continues from.
    pub index: usize,
    /// Look-ahead in seconds for templated live content.
    pub upper_limit: Option<f64>,
    /// Stop after this many segments.
    pub max_segments: Option<usize>,
}

impl SegmentRequest {
    fn limit(&self) -> usize {
        self.max_segments.unwrap_or(usize::MAX)
    }
}

/// Builds the segments of `representation` using its stored availability window.
pub fn build_segments(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    request: &SegmentRequest,
) -> Vec<Segment> {
    let window = representation.representation().segment_availability_range;
    build_segments_in_window(converter, is_dynamic, representation, window, request)
}

/// A copy of the representation with a fresh availability window and the segments
/// inside it. The manifest itself is left alone.
pub fn refresh_representation(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    request: &SegmentRequest,
) -> Representation {
    let window = converter.calc_segment_availability_range(representation, is_dynamic);
    let segments = build_segments_in_window(converter, is_dynamic, representation, Some(window), request);
    representation.representation().with_availability_range(window).with_segments(segments)
}

fn build_segments_in_window(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    window: Option<TimeRange>,
    request: &SegmentRequest,
) -> Vec<Segment> {
    let segments = match representation.representation().addressing {
        AddressingMode::Timeline => timeline_segments(converter, is_dynamic, representation, window, request),
        AddressingMode::Template => template_segments(converter, is_dynamic, representation, window, request),
        AddressingMode::List => list_segments(converter, is_dynamic, representation, request),
        AddressingMode::Base => vec![base_segment(converter, is_dynamic, representation)],
    };
    debug!(
        "Built {} segments for representation {:?} ({:?})",
        segments.len(),
        representation.representation().id,
        representation.representation().addressing
    );
    segments
}

/// Identifiers shared by every segment of `rep`.
fn representation_values(rep: &Representation) -> TemplateValues<'_> {
    TemplateValues { representation_id: rep.id.as_deref(), bandwidth: Some(rep.bandwidth), ..Default::default() }
}

/// Expands the `S` entries of a `SegmentTimeline`. With a window, live segments that
/// ended before it or start after it are left out; `availability_idx` keeps counting
/// through them.
pub fn timeline_segments(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    window: Option<TimeRange>,
    request: &SegmentRequest,
) -> Vec<Segment> {
    let rep = representation.representation();
    let Some(entries) = rep.segment_timeline.as_deref() else {
        return Vec::new();
    };
    let timescale = rep.timescale as f64;
    let values = representation_values(rep);
    let limit = request.limit();
    let live_window = window.filter(|_| is_dynamic);

    // Media time (timescale units) at which an open-ended repeat stops.
    let period = representation.period();
    let mut open_end = converter.calc_media_time_from_presentation_time(period.start + period.duration, representation);
    if !open_end.is_finite() {
        if let Some(window) = window {
            open_end = converter.calc_media_time_from_presentation_time(window.end, representation);
        }
    }
    let open_end = open_end * timescale;

    let mut segments = Vec::new();
    let mut index = 0;
    let mut time: u64 = 0;
    for (i, entry) in entries.iter().enumerate() {
        if let Some(t) = entry.t {
            time = t;
        }
        if entry.d == 0 {
            warn!("Skipping SegmentTimeline entry without duration in representation {:?}", rep.id);
            continue;
        }

        let repeat = if entry.r >= 0 {
            entry.r as u64
        } else {
            let end = match entries.get(i + 1).and_then(|next| next.t) {
                Some(next_t) => next_t as f64,
                None => open_end,
            };
            if end.is_finite() {
                (((end - time as f64) / entry.d as f64).ceil() - 1.0).max(0.0) as u64
            } else {
                warn!("Open-ended SegmentTimeline repeat in representation {:?} has no end, using 0", rep.id);
                0
            }
        };

        for _ in 0..=repeat {
            if segments.len() >= limit {
                return segments;
            }
            let (item_media, item_range) = match rep.segment_list.get(index) {
                Some(item) => (item.media.as_deref(), item.media_range.as_deref()),
                None => (rep.media.as_deref(), None),
            };
            let timing = SegmentTiming {
                time: time as f64,
                duration: entry.d as f64,
                timescale,
                media: item_media,
                media_range: item_range,
                manifest_time: Some(time),
            };
            let mut seg = get_time_based_segment(converter, is_dynamic, representation, timing, index);
            index += 1;
            time += entry.d;

            if let Some(window) = live_window {
                if seg.presentation_start_time > window.end {
                    return segments;
                }
                if seg.presentation_end_time() <= window.start {
                    continue;
                }
            }
            seg.media = seg.media.as_deref().map(|url| resolve_segment_url(url, &values));
            segments.push(seg);
        }
    }
    segments
}

/// Fixed-duration template addressing. Live manifests build the indices inside the
/// availability window, static ones the whole period.
pub fn template_segments(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    window: Option<TimeRange>,
    request: &SegmentRequest,
) -> Vec<Segment> {
    let rep = representation.representation();
    let period = representation.period();
    let timescale = rep.timescale as f64;
    let with_media = |mut seg: Segment| {
        let time = media_time_in_timescale(seg.media_start_time, timescale);
        seg.replacement_time = Some(time);
        seg.media = rep.media.as_deref().map(|url| {
            let values = TemplateValues { number: Some(seg.replacement_number), time: Some(time), ..representation_values(rep) };
            resolve_segment_url(url, &values)
        });
        seg
    };

    let Some(duration) = rep.segment_duration.filter(|d| *d > 0.0) else {
        return vec![with_media(get_index_based_segment(converter, is_dynamic, representation, 0))];
    };

    let period_count = (period.duration / duration).ceil();
    let (start, end) = if is_dynamic {
        let range = decide_segment_list_range_in_window(
            converter,
            is_dynamic,
            representation,
            window,
            request.requested_time,
            request.index,
            request.upper_limit,
        );
        if !range.is_available() {
            debug!("No availability window for representation {:?} yet", rep.id);
            return Vec::new();
        }
        (range.start.max(0.0), range.end.min(period_count - 1.0))
    } else {
        (0.0, period_count - 1.0)
    };

    if start.is_nan() || end.is_nan() || !end.is_finite() {
        warn!("No finite segment range for representation {:?}", rep.id);
        return Vec::new();
    }
    if end < start {
        return Vec::new();
    }

    (start as usize..=end as usize)
        .take(request.limit())
        .map(|index| with_media(get_index_based_segment(converter, is_dynamic, representation, index)))
        .collect()
}

fn media_time_in_timescale(media_time: f64, timescale: f64) -> u64 {
    (media_time * timescale).round().max(0.0) as u64
}

/// One segment per `SegmentURL`.
pub fn list_segments(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    request: &SegmentRequest,
) -> Vec<Segment> {
    representation
        .representation()
        .segment_list
        .iter()
        .take(request.limit())
        .enumerate()
        .map(|(index, item)| {
            let mut seg = get_index_based_segment(converter, is_dynamic, representation, index);
            seg.media = item.media.clone();
            seg.media_range = item.media_range.clone();
            seg
        })
        .collect()
}

/// The single segment of a representation addressed only by its BaseURL.
pub fn base_segment(converter: &dyn TimelineConverter, is_dynamic: bool, representation: RepresentationRef<'_>) -> Segment {
    let rep = representation.representation();
    let mut seg = get_index_based_segment(converter, is_dynamic, representation, 0);
    seg.media = rep.base_url.clone();
    seg.media_range = rep.index_range.clone();
    seg
}
