mod common;

use common::{
    availability_start, parse, rep, CAPPED_TIMELINE_MPD, FINITE_LIVE_MPD, LIST_MPD, LIVE_MPD, LIVE_TIMELINE_MPD,
    OPEN_REPEAT_MPD, VOD_MPD,
};
use dash_manifest::segment::builder::get_index_based_segment;
use dash_manifest::timeline::add_seconds;
use dash_manifest::{build_segments, get_segment_by_index, refresh_representation, DashTimelineConverter, SegmentRequest};
use proptest::prelude::*;

fn converter() -> DashTimelineConverter {
    DashTimelineConverter::new(common::fixed_clock())
}

#[test]
fn static_template_covers_the_period() {
    let manifest = parse(VOD_MPD);
    let segments = build_segments(&converter(), false, rep(&manifest, "v1"), &SegmentRequest::default());

    assert_eq!(segments.len(), 8);
    assert_eq!(segments[0].media.as_deref(), Some("v1/seg-00001.m4s"));
    assert_eq!(segments[7].media.as_deref(), Some("v1/seg-00008.m4s"));
    assert_eq!(segments[7].presentation_start_time, 28.0);
    assert_eq!(segments[3].replacement_time, Some(12000));
    assert!(segments.iter().enumerate().all(|(i, s)| s.availability_idx == i));
    assert!(segments.windows(2).all(|w| w[0].presentation_start_time < w[1].presentation_start_time));
    assert!(segments.iter().all(|s| s.wall_start_time.is_none()));
}

#[test]
fn start_number_offsets_replacement_numbers() {
    let manifest = parse(VOD_MPD);
    let request = SegmentRequest { max_segments: Some(3), ..Default::default() };
    let segments = build_segments(&converter(), false, rep(&manifest, "v2"), &request);

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].replacement_number, 10);
    assert_eq!(segments[2].media.as_deref(), Some("v2/seg-00012.m4s"));
    assert_eq!(segments[2].duration, 2.0);
}

#[test]
fn timeline_entries_expand_with_repeats() {
    let manifest = parse(VOD_MPD);
    let segments = build_segments(&converter(), false, rep(&manifest, "a1"), &SegmentRequest::default());

    let media: Vec<_> = segments.iter().map(|s| s.media.as_deref().unwrap()).collect();
    assert_eq!(media, vec!["audio/0.m4s", "audio/96000.m4s", "audio/192000.m4s", "audio/288000.m4s"]);

    let starts: Vec<f64> = segments.iter().map(|s| s.presentation_start_time).collect();
    assert_eq!(starts, vec![0.0, 2.0, 4.0, 6.0]);
    assert_eq!(segments[3].duration, 1.0);
    assert_eq!(segments[2].replacement_time, Some(192000));
    assert_eq!(segments[0].availability_start_time, Some(manifest.loaded_time));
}

#[test]
fn open_ended_repeat_runs_to_the_period_end() {
    let manifest = parse(OPEN_REPEAT_MPD);
    let segments = build_segments(&converter(), false, rep(&manifest, "r1"), &SegmentRequest::default());

    assert_eq!(segments.len(), 5);
    assert_eq!(segments[4].media.as_deref(), Some("t-8.m4s"));
}

#[test]
fn list_segments_carry_their_urls() {
    let manifest = parse(LIST_MPD);
    let segments = build_segments(&converter(), false, rep(&manifest, "l1"), &SegmentRequest::default());

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].media.as_deref(), Some("s1.m4s"));
    assert_eq!(segments[0].media_range.as_deref(), Some("0-99"));
    assert_eq!(segments[2].presentation_start_time, 4.0);
    assert_eq!(segments[1].media_range, None);
}

#[test]
fn base_representation_is_one_segment() {
    let manifest = parse(LIST_MPD);
    let segments = build_segments(&converter(), false, rep(&manifest, "b1"), &SegmentRequest::default());

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].duration, 6.0);
    assert_eq!(segments[0].media.as_deref(), Some("http://base.example.com/file.mp4"));
    assert_eq!(segments[0].media_range.as_deref(), Some("100-200"));
}

#[test]
fn live_template_follows_the_availability_window() {
    let manifest = parse(LIVE_MPD);
    let refreshed = refresh_representation(&converter(), true, rep(&manifest, "live-v"), &SegmentRequest::default());

    let window = refreshed.segment_availability_range.unwrap();
    assert_eq!((window.start, window.end), (40.0, 98.0));

    let segments = refreshed.segments().unwrap();
    assert_eq!(segments.len(), 30);
    let first = &segments[0];
    assert_eq!(first.availability_idx, 20);
    assert_eq!(first.presentation_start_time, 40.0);
    assert_eq!(first.media.as_deref(), Some("live/live-v/21.m4s"));
    assert_eq!(first.availability_start_time, add_seconds(availability_start(), 40.0));
    assert_eq!(first.availability_end_time, add_seconds(availability_start(), 102.0));
    assert_eq!(first.wall_start_time, add_seconds(availability_start(), 46.0));
    assert!(segments.iter().all(|s| s.availability_end_time >= s.availability_start_time));
}

#[test]
fn live_template_without_a_window_builds_nothing() {
    let manifest = parse(FINITE_LIVE_MPD);
    let ev = rep(&manifest, "ev");
    assert!(ev.representation().segment_availability_range.is_none());

    let segments = build_segments(&converter(), true, ev, &SegmentRequest::default());
    assert!(segments.is_empty());

    let refreshed = refresh_representation(&converter(), true, ev, &SegmentRequest::default());
    let segments = refreshed.segments().unwrap();
    assert!(!segments.is_empty());
    assert!(segments.iter().all(|s| s.presentation_start_time <= 100.0));
}

#[test]
fn live_timeline_keeps_only_the_availability_window() {
    let manifest = parse(LIVE_TIMELINE_MPD);
    let refreshed = refresh_representation(&converter(), true, rep(&manifest, "tl-v"), &SegmentRequest::default());

    let window = refreshed.segment_availability_range.unwrap();
    assert_eq!((window.start, window.end), (40.0, 100.0));

    let segments = refreshed.segments().unwrap();
    let indices: Vec<usize> = segments.iter().map(|s| s.availability_idx).collect();
    assert_eq!(indices, (4..=10).collect::<Vec<_>>());
    assert_eq!(segments[0].media.as_deref(), Some("tl-40.m4s"));
    assert_eq!(segments[6].media.as_deref(), Some("tl-100.m4s"));
    assert_eq!(segments[0].replacement_number, 5);
}

#[test]
fn timeline_durations_are_capped_by_max_segment_duration() {
    let manifest = parse(CAPPED_TIMELINE_MPD);
    let segments = build_segments(&converter(), false, rep(&manifest, "c1"), &SegmentRequest::default());

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].duration, 2.0);
    assert_eq!(segments[0].presentation_end_time(), 2.0);
    assert_eq!(segments[1].presentation_start_time, 5.0);
    assert_eq!(segments[1].media.as_deref(), Some("c-5000.m4s"));
}

#[test]
fn template_media_resolves_every_identifier() {
    let manifest = parse(
        r#"<MPD type="static" mediaPresentationDuration="PT4S">
             <Period>
               <AdaptationSet mimeType="video/mp4">
                 <SegmentTemplate duration="2" media="$RepresentationID$-$Bandwidth$-$Time$-$Number$$$x.m4s"/>
                 <Representation id="hd" bandwidth="900"/>
               </AdaptationSet>
             </Period>
           </MPD>"#,
    );
    let segments = build_segments(&converter(), false, rep(&manifest, "hd"), &SegmentRequest::default());

    let media: Vec<_> = segments.iter().map(|s| s.media.as_deref().unwrap()).collect();
    assert_eq!(media, vec!["hd-900-0-1$x.m4s", "hd-900-2-2$x.m4s"]);
}

#[test]
fn segment_lookup_by_availability_index() {
    let manifest = parse(LIVE_MPD);
    let refreshed = refresh_representation(&converter(), true, rep(&manifest, "live-v"), &SegmentRequest::default());

    assert_eq!(get_segment_by_index(25, Some(&refreshed)).map(|s| s.availability_idx), Some(25));
    assert_eq!(get_segment_by_index(49, Some(&refreshed)).map(|s| s.replacement_number), Some(50));
    assert!(get_segment_by_index(3, Some(&refreshed)).is_none());
    assert!(get_segment_by_index(0, None).is_none());

    let unbuilt = rep(&manifest, "live-v").representation();
    assert!(get_segment_by_index(0, Some(unbuilt)).is_none());

    let vod = parse(VOD_MPD);
    let built = refresh_representation(&converter(), false, rep(&vod, "v1"), &SegmentRequest::default());
    assert_eq!(get_segment_by_index(2, Some(&built)).map(|s| s.presentation_start_time), Some(8.0));
}

proptest! {
    #[test]
    fn prop_index_segments_are_evenly_spaced(
        start in 0.0f64..1000.0,
        duration in 0.1f64..10.0,
        index in 0usize..500,
    ) {
        let mut manifest = parse(VOD_MPD);
        manifest.periods[0].start = start;
        let id = rep(&manifest, "v1").id();
        manifest.representations[id.0].segment_duration = Some(duration);

        let converter = converter();
        let representation = manifest.representation_ref(id).unwrap();
        let a = get_index_based_segment(&converter, false, representation, index);
        let b = get_index_based_segment(&converter, false, representation, index + 1);

        prop_assert!((b.presentation_start_time - a.presentation_start_time - duration).abs() <= 1.0001e-5);
        prop_assert_eq!(b.replacement_number, a.replacement_number + 1);
    }
}
