mod common;

use common::{now, parse, parser, rep, LIST_MPD, VOD_MPD};
use dash_manifest::mpd::maps::AttributeMaps;
use dash_manifest::mpd::matchers::Matcher;
use dash_manifest::mpd::normalizer::normalize;
use dash_manifest::mpd::tree::TypedValue;
use dash_manifest::mpd::{AddressingMode, ManifestType, TimelineEntry};
use dash_manifest::{DocumentReader, ParseError, XmlReader};

#[test]
fn manifest_fields_are_typed() {
    let manifest = parse(VOD_MPD);
    assert_eq!(manifest.manifest_type, ManifestType::Static);
    assert_eq!(manifest.media_presentation_duration, Some(30.0));
    assert_eq!(manifest.min_buffer_time, 2.0);
    assert!(manifest.max_segment_duration.is_infinite());
    assert!(manifest.time_shift_buffer_depth.is_infinite());
    assert_eq!(manifest.loaded_time, now());
    assert_eq!(manifest.base_url.as_deref(), Some("http://cdn.example.com/content/"));
    assert_eq!(manifest.periods.len(), 1);
    assert_eq!(manifest.adaptation_sets.len(), 2);
    assert_eq!(manifest.representations.len(), 3);

    let period = &manifest.periods[0];
    assert_eq!(period.id.as_deref(), Some("p0"));
    assert_eq!(period.start, 0.0);
    assert_eq!(period.duration, 30.0);
}

#[test]
fn template_is_inherited_from_the_adaptation_set() {
    let manifest = parse(VOD_MPD);
    let v1 = rep(&manifest, "v1").representation();
    assert_eq!(v1.addressing, AddressingMode::Template);
    assert_eq!(v1.timescale, 1000);
    assert_eq!(v1.segment_duration, Some(4.0));
    assert_eq!(v1.start_number, 1);
    assert_eq!(v1.media.as_deref(), Some("$RepresentationID$/seg-$Number%05d$.m4s"));
    assert_eq!(v1.initialization.as_deref(), Some("v1/init.mp4"));
    assert_eq!(v1.mime_type.as_deref(), Some("video/mp4"));
}

#[test]
fn own_values_win_over_inherited_ones() {
    let manifest = parse(VOD_MPD);

    let v1 = rep(&manifest, "v1").representation();
    assert_eq!(v1.codecs.as_deref(), Some("avc1.64001e"));

    let v2 = rep(&manifest, "v2").representation();
    assert_eq!(v2.codecs.as_deref(), Some("avc1.4d401f"));
    assert_eq!(v2.segment_duration, Some(2.0));
    assert_eq!(v2.start_number, 10);
    assert_eq!(v2.media.as_deref(), Some("$RepresentationID$/seg-$Number%05d$.m4s"));
    assert_eq!(v2.initialization.as_deref(), Some("v2/init.mp4"));
}

#[test]
fn timeline_and_base_url_are_resolved() {
    let manifest = parse(VOD_MPD);
    let a1 = rep(&manifest, "a1");
    let rep = a1.representation();
    assert_eq!(rep.addressing, AddressingMode::Timeline);
    assert_eq!(rep.timescale, 48000);
    assert_eq!(
        rep.segment_timeline.as_deref(),
        Some(&[TimelineEntry { t: Some(0), d: 96000, r: 2 }, TimelineEntry { t: None, d: 48000, r: 0 }][..])
    );
    assert_eq!(rep.base_url.as_deref(), Some("http://cdn.example.com/content/audio-en/"));
    assert_eq!(a1.adaptation().lang.as_deref(), Some("en"));
    assert_eq!(a1.period().id.as_deref(), Some("p0"));
}

#[test]
fn list_and_base_addressing() {
    let manifest = parse(LIST_MPD);
    let l1 = rep(&manifest, "l1").representation();
    assert_eq!(l1.addressing, AddressingMode::List);
    assert_eq!(l1.segment_duration, Some(2.0));
    assert_eq!(l1.initialization.as_deref(), Some("init.mp4"));
    assert_eq!(l1.segment_list.len(), 3);
    assert_eq!(l1.segment_list[0].media_range.as_deref(), Some("0-99"));

    let b1 = rep(&manifest, "b1").representation();
    assert_eq!(b1.addressing, AddressingMode::Base);
    assert_eq!(b1.index_range.as_deref(), Some("100-200"));
    assert_eq!(b1.segment_duration, None);
}

#[test]
fn normalization_is_idempotent() {
    let raw = XmlReader.read(VOD_MPD, &Matcher::PRIORITY).unwrap().unwrap();
    let maps = AttributeMaps::default();
    let once = normalize(&maps, &raw).unwrap();
    let twice = normalize(&maps, &once).unwrap();
    assert_eq!(once, twice);
    assert_ne!(once, raw);
}

#[test]
fn descriptors_merge_by_scheme_and_reach_sub_representations() {
    let doc = r#"<MPD>
      <Period>
        <AdaptationSet codecs="a">
          <ContentProtection schemeIdUri="urn:A" value="as"/>
          <ContentProtection schemeIdUri="urn:B"/>
          <Representation id="r" bandwidth="1">
            <ContentProtection schemeIdUri="urn:A" cenc="own"/>
            <SubRepresentation level="1"/>
          </Representation>
        </AdaptationSet>
      </Period>
    </MPD>"#;
    let raw = XmlReader.read(doc, &Matcher::PRIORITY).unwrap().unwrap();
    let maps = AttributeMaps::default();
    let once = normalize(&maps, &raw).unwrap();

    let representation = once
        .first_child("Period")
        .and_then(|p| p.first_child("AdaptationSet"))
        .and_then(|a| a.first_child("Representation"))
        .unwrap();

    let protection = representation.children("ContentProtection");
    assert_eq!(protection.len(), 2);
    assert_eq!(protection[0].text_attribute("schemeIdUri").as_deref(), Some("urn:A"));
    assert_eq!(protection[0].text_attribute("cenc").as_deref(), Some("own"));
    assert_eq!(protection[0].text_attribute("value").as_deref(), Some("as"));
    assert_eq!(protection[1].text_attribute("schemeIdUri").as_deref(), Some("urn:B"));

    let sub = representation.first_child("SubRepresentation").unwrap();
    assert_eq!(sub.attribute("codecs"), Some(&TypedValue::String("a".into())));
    assert_eq!(sub.attribute("level"), Some(&TypedValue::Integer(1)));

    assert_eq!(normalize(&maps, &once).unwrap(), once);
}

#[test]
fn identifiers_stay_strings() {
    let manifest = parse(r#"<MPD><Period id="007"><AdaptationSet><Representation id="0010" bandwidth="1"/></AdaptationSet></Period></MPD>"#);
    assert_eq!(manifest.periods[0].id.as_deref(), Some("007"));
    assert_eq!(manifest.representations[0].id.as_deref(), Some("0010"));
}

#[test]
fn period_durations_follow_the_next_start() {
    let manifest = parse(
        r#"<MPD type="static" mediaPresentationDuration="PT50S">
             <Period id="a" duration="PT20S"/>
             <Period id="b"/>
             <Period id="c" start="PT35S"/>
           </MPD>"#,
    );
    let timing: Vec<(f64, f64)> = manifest.periods.iter().map(|p| (p.start, p.duration)).collect();
    assert_eq!(timing, vec![(0.0, 20.0), (20.0, 15.0), (35.0, 15.0)]);
}

#[test]
fn first_live_period_starts_at_zero() {
    let manifest = parse(
        r#"<MPD type="dynamic" availabilityStartTime="2024-01-01T00:00:00Z">
             <Period id="a"/>
           </MPD>"#,
    );
    assert!(manifest.is_dynamic());
    assert_eq!(manifest.periods[0].start, 0.0);
}

#[test]
fn live_period_without_end_is_open() {
    let manifest = parse(common::LIVE_MPD);
    assert!(manifest.is_dynamic());
    assert!(manifest.periods[0].duration.is_infinite());
    assert_eq!(manifest.time_shift_buffer_depth, 60.0);
    assert_eq!(manifest.suggested_presentation_delay, 6.0);
    assert_eq!(manifest.availability_start_time, Some(common::availability_start()));
}

#[test]
fn json_manifests_get_a_normalized_base_url() {
    let json = r#"{
        "type": "static",
        "mediaPresentationDuration": "PT10S",
        "BaseURL_asArray": ["www.example.com/vod", "http://backup.example.com/"],
        "Period_asArray": [{
            "id": "p0",
            "AdaptationSet_asArray": [{
                "mimeType": "video/mp4",
                "SegmentTemplate": {"timescale": 1, "duration": 2, "media": "$RepresentationID$_$Number$.m4s"},
                "Representation_asArray": [{"id": "j1", "bandwidth": 300000}]
            }]
        }]
    }"#;
    let manifest = parser().parse_json(json).unwrap();
    assert_eq!(manifest.base_url.as_deref(), Some("http://www.example.com/vod/"));

    let j1 = rep(&manifest, "j1").representation();
    assert_eq!(j1.bandwidth, 300000);
    assert_eq!(j1.segment_duration, Some(2.0));
    assert_eq!(j1.addressing, AddressingMode::Template);
    assert_eq!(j1.base_url.as_deref(), Some("http://www.example.com/vod/"));
}

#[test]
fn empty_document_is_a_read_error() {
    assert!(matches!(parser().parse(""), Err(ParseError::DocumentRead(_))));
}

#[test]
fn malformed_document_is_a_read_error() {
    assert!(matches!(parser().parse("<MPD><Period></MPD>"), Err(ParseError::DocumentRead(_))));
    assert!(matches!(parser().parse_json("{\"MPD\": "), Err(ParseError::DocumentRead(_))));
}

#[test]
fn manifest_without_period_fails_normalization() {
    assert!(matches!(parser().parse(r#"<MPD type="static"></MPD>"#), Err(ParseError::Normalization(_))));
}
