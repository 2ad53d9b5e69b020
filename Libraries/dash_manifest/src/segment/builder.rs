use crate::mpd::RepresentationRef;
use crate::segment::template::replace_token_for_template;
use crate::segment::Segment;
use crate::timeline::TimelineConverter;
use chrono::{DateTime, Utc};

/// Fractional digits kept for index-based segment boundaries.
pub const SEGMENT_TIME_PRECISION: usize = 5;

/// Rounds `value` to [`SEGMENT_TIME_PRECISION`] fractional digits using exact decimal
/// rounding of the binary value, ties away from zero. Boundaries computed as
/// `start + index * duration` drift in the last bits; this snaps them back onto the
/// encoder's grid.
pub fn round_to_precision(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    if is_exact_tie(value) {
        let scale = 10f64.powi(SEGMENT_TIME_PRECISION as i32);
        return (value * scale).round() / scale;
    }
    format!("{:.*}", SEGMENT_TIME_PRECISION, value).parse().unwrap_or(value)
}

/// Whether the exact decimal expansion of `value` ends in a 5 right after the kept
/// digits. String formatting resolves those ties to even, we want them away from zero.
fn is_exact_tie(value: f64) -> bool {
    let expanded = format!("{:.40}", value.abs());
    let Some((_, fraction)) = expanded.split_once('.') else {
        return false;
    };
    let mut rest = fraction.bytes().skip(SEGMENT_TIME_PRECISION);
    rest.next() == Some(b'5') && rest.all(|b| b == b'0')
}

/// Timing of a segment taken from a `SegmentTimeline` or a `$Time$`-addressed
/// template, in timescale units.
#[derive(Debug, Clone, Copy)]
pub struct SegmentTiming<'a> {
    pub time: f64,
    pub duration: f64,
    pub timescale: f64,
    /// Media URL template still holding `$Number$` / `$Time$`.
    pub media: Option<&'a str>,
    pub media_range: Option<&'a str>,
    /// `time` exactly as declared, when it is known without rounding.
    pub manifest_time: Option<u64>,
}

#[allow(clippy::too_many_arguments)]
fn build_segment(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    duration: f64,
    presentation_start_time: f64,
    media_start_time: f64,
    availability_start_time: Option<DateTime<Utc>>,
    presentation_end_time: f64,
    index: usize,
) -> Segment {
    let manifest = representation.manifest();
    let mut seg = Segment {
        representation: representation.id(),
        duration,
        presentation_start_time,
        media_start_time,
        availability_start_time,
        availability_end_time: converter.calc_availability_end_time_from_presentation_time(presentation_end_time, manifest, is_dynamic),
        wall_start_time: None,
        replacement_number: representation.representation().start_number + index as u64,
        replacement_time: None,
        availability_idx: index,
        media: None,
        media_range: None,
    };
    seg.wall_start_time = converter.calc_wall_time_for_segment(&seg, manifest, is_dynamic);
    seg
}

/// Segment `index` of a representation addressed by a fixed duration.
///
/// Without a declared duration the representation holds exactly one segment that spans
/// the whole period.
pub fn get_index_based_segment(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    index: usize,
) -> Segment {
    let period = representation.period();
    let duration = representation
        .representation()
        .segment_duration
        .filter(|d| !d.is_nan())
        .unwrap_or(period.duration);

    let presentation_start_time = round_to_precision(period.start + index as f64 * duration);
    let presentation_end_time = round_to_precision(presentation_start_time + duration);

    build_segment(
        converter,
        is_dynamic,
        representation,
        duration,
        presentation_start_time,
        converter.calc_media_time_from_presentation_time(presentation_start_time, representation),
        converter.calc_availability_start_time_from_presentation_time(presentation_start_time, representation.manifest(), is_dynamic),
        presentation_end_time,
        index,
    )
}

/// Segment `index` with explicit timing. The media URL gets `$Number$` and `$Time$`
/// substituted; escaped dollars are left for the caller to unescape.
pub fn get_time_based_segment(
    converter: &dyn TimelineConverter,
    is_dynamic: bool,
    representation: RepresentationRef<'_>,
    timing: SegmentTiming<'_>,
    index: usize,
) -> Segment {
    let manifest = representation.manifest();
    let scaled_time = timing.time / timing.timescale;
    let scaled_duration = (timing.duration / timing.timescale).min(manifest.max_segment_duration);

    let presentation_start_time = converter.calc_presentation_time_from_media_time(scaled_time, representation);
    let presentation_end_time = presentation_start_time + scaled_duration;

    let mut seg = build_segment(
        converter,
        is_dynamic,
        representation,
        scaled_duration,
        presentation_start_time,
        scaled_time,
        Some(manifest.loaded_time),
        presentation_end_time,
        index,
    );

    let replacement_time = timing.manifest_time.unwrap_or_else(|| timing.time.max(0.0).round() as u64);
    seg.replacement_time = Some(replacement_time);
    seg.media = timing.media.map(|url| {
        let url = replace_token_for_template(url, "Number", seg.replacement_number);
        replace_token_for_template(&url, "Time", replacement_time)
    });
    seg.media_range = timing.media_range.map(str::to_string);
    seg
}
