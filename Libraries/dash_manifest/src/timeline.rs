//! Conversions between the media, presentation, period and wall-clock timelines.
//!
//! Segment construction never reads a clock itself; every conversion goes through a
//! [`TimelineConverter`] so players can plug in their own clock synchronization and
//! tests can pin time.

use crate::mpd::{Manifest, RepresentationRef, TimeRange};
use crate::segment::Segment;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::debug;

/// Source of "now" for live computations.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Adds fractional seconds to `time` with millisecond resolution.
pub fn add_seconds(time: DateTime<Utc>, seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let delta = TimeDelta::try_milliseconds((seconds * 1000.0).round() as i64)?;
    time.checked_add_signed(delta)
}

/// Seconds elapsed from `from` to `to`, negative when `to` is earlier.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

pub trait TimelineConverter {
    fn calc_media_time_from_presentation_time(&self, presentation_time: f64, representation: RepresentationRef<'_>) -> f64;

    fn calc_presentation_time_from_media_time(&self, media_time: f64, representation: RepresentationRef<'_>) -> f64;

    fn calc_availability_start_time_from_presentation_time(
        &self,
        presentation_time: f64,
        manifest: &Manifest,
        is_dynamic: bool,
    ) -> Option<DateTime<Utc>>;

    fn calc_availability_end_time_from_presentation_time(
        &self,
        presentation_end_time: f64,
        manifest: &Manifest,
        is_dynamic: bool,
    ) -> Option<DateTime<Utc>>;

    fn calc_wall_time_for_segment(&self, segment: &Segment, manifest: &Manifest, is_dynamic: bool) -> Option<DateTime<Utc>>;

    fn calc_period_relative_time_from_mpd_relative_time(&self, representation: RepresentationRef<'_>, mpd_relative_time: f64) -> f64;

    fn is_time_sync_completed(&self) -> bool;

    /// The span of the MPD timeline whose segments may currently be requested. The
    /// default covers the whole period, which is right for static manifests.
    fn calc_segment_availability_range(&self, representation: RepresentationRef<'_>, _is_dynamic: bool) -> TimeRange {
        let period = representation.period();
        TimeRange { start: period.start, end: period.start + period.duration }
    }
}

/// Converter following the DASH timing model, with an optional client/server clock
/// offset obtained by an external time synchronization.
#[derive(Clone)]
pub struct DashTimelineConverter {
    /// Server time minus client time, in seconds.
    client_server_time_shift: f64,
    time_sync_completed: bool,
    clock: Clock,
}

impl std::fmt::Debug for DashTimelineConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashTimelineConverter")
            .field("client_server_time_shift", &self.client_server_time_shift)
            .field("time_sync_completed", &self.time_sync_completed)
            .field("clock", &"<clock>")
            .finish()
    }
}

impl Default for DashTimelineConverter {
    fn default() -> Self {
        Self::new(system_clock())
    }
}

impl DashTimelineConverter {
    pub fn new(clock: Clock) -> Self {
        Self { client_server_time_shift: 0.0, time_sync_completed: false, clock }
    }

    /// Records the outcome of a clock synchronization.
    pub fn set_time_sync_result(&mut self, client_server_time_shift: f64) {
        debug!("Time sync completed, client/server shift {:.3}s", client_server_time_shift);
        self.client_server_time_shift = client_server_time_shift;
        self.time_sync_completed = true;
    }

    pub fn reset(&mut self) {
        self.client_server_time_shift = 0.0;
        self.time_sync_completed = false;
    }

    pub fn client_server_time_shift(&self) -> f64 {
        self.client_server_time_shift
    }

    /// Position of `wall_time` on the MPD timeline of a live manifest.
    pub fn calc_presentation_time_from_wall_time(&self, wall_time: DateTime<Utc>, manifest: &Manifest) -> f64 {
        match manifest.availability_start_time {
            Some(ast) => seconds_between(ast, wall_time) + self.client_server_time_shift,
            None => f64::NAN,
        }
    }
}

impl TimelineConverter for DashTimelineConverter {
    fn calc_media_time_from_presentation_time(&self, presentation_time: f64, representation: RepresentationRef<'_>) -> f64 {
        let period_start = representation.period().start;
        presentation_time - period_start + representation.representation().presentation_time_offset
    }

    fn calc_presentation_time_from_media_time(&self, media_time: f64, representation: RepresentationRef<'_>) -> f64 {
        let period_start = representation.period().start;
        media_time + (period_start - representation.representation().presentation_time_offset)
    }

    fn calc_availability_start_time_from_presentation_time(
        &self,
        presentation_time: f64,
        manifest: &Manifest,
        is_dynamic: bool,
    ) -> Option<DateTime<Utc>> {
        let ast = manifest.availability_start_time?;
        if is_dynamic {
            add_seconds(ast, presentation_time - self.client_server_time_shift)
        } else {
            Some(ast)
        }
    }

    fn calc_availability_end_time_from_presentation_time(
        &self,
        presentation_end_time: f64,
        manifest: &Manifest,
        is_dynamic: bool,
    ) -> Option<DateTime<Utc>> {
        if is_dynamic && manifest.time_shift_buffer_depth.is_finite() {
            add_seconds(manifest.availability_start_time?, presentation_end_time + manifest.time_shift_buffer_depth)
        } else {
            manifest.availability_end_time
        }
    }

    fn calc_wall_time_for_segment(&self, segment: &Segment, manifest: &Manifest, is_dynamic: bool) -> Option<DateTime<Utc>> {
        if !is_dynamic {
            return None;
        }
        let display_start = segment.presentation_start_time + manifest.suggested_presentation_delay;
        add_seconds(manifest.availability_start_time?, display_start)
    }

    fn calc_period_relative_time_from_mpd_relative_time(&self, representation: RepresentationRef<'_>, mpd_relative_time: f64) -> f64 {
        mpd_relative_time - representation.period().start
    }

    fn is_time_sync_completed(&self) -> bool {
        self.time_sync_completed
    }

    fn calc_segment_availability_range(&self, representation: RepresentationRef<'_>, is_dynamic: bool) -> TimeRange {
        let period = representation.period();
        let rep = representation.representation();
        let static_range = TimeRange { start: period.start, end: period.start + period.duration };
        if !is_dynamic {
            return static_range;
        }
        if !self.time_sync_completed {
            if let Some(range) = rep.segment_availability_range {
                return range;
            }
        }

        let manifest = representation.manifest();
        let segment_duration = rep
            .segment_duration
            .or_else(|| rep.segments().and_then(|s| s.last()).map(|s| s.duration))
            .unwrap_or(0.0);
        let now = self.calc_presentation_time_from_wall_time((self.clock)(), manifest);
        let period_end = period.start + period.duration;

        let start = (now - manifest.time_shift_buffer_depth).max(period.start);
        let end = if now >= period_end && now - segment_duration < period_end {
            period_end
        } else {
            now - segment_duration
        };
        TimeRange { start, end }
    }
}
