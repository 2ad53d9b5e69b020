#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use dash_manifest::mpd::Manifest;
use dash_manifest::{Clock, DashParser, RepresentationRef};
use std::sync::Arc;

pub const VOD_MPD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static" mediaPresentationDuration="PT30S" minBufferTime="PT2S" profiles="urn:mpeg:dash:profile:isoff-live:2011">
  <BaseURL>http://cdn.example.com/content/</BaseURL>
  <Period id="p0">
    <AdaptationSet id="1" mimeType="video/mp4" contentType="video" codecs="avc1.4d401f">
      <SegmentTemplate timescale="1000" duration="4000" startNumber="1" media="$RepresentationID$/seg-$Number%05d$.m4s" initialization="$RepresentationID$/init.mp4"/>
      <Representation id="v1" bandwidth="800000" width="640" height="360" codecs="avc1.64001e"/>
      <Representation id="v2" bandwidth="1600000" width="1280" height="720">
        <SegmentTemplate timescale="1000" duration="2000" startNumber="10"/>
      </Representation>
    </AdaptationSet>
    <AdaptationSet id="2" mimeType="audio/mp4" lang="en">
      <SegmentTemplate timescale="48000" media="audio/$Time$.m4s" initialization="audio/init.mp4">
        <SegmentTimeline>
          <S t="0" d="96000" r="2"/>
          <S d="48000"/>
        </SegmentTimeline>
      </SegmentTemplate>
      <Representation id="a1" bandwidth="128000">
        <BaseURL>audio-en/</BaseURL>
      </Representation>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const LIVE_MPD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD type="dynamic" availabilityStartTime="2024-01-01T00:00:00Z" minBufferTime="PT4S" timeShiftBufferDepth="PT60S" suggestedPresentationDelay="PT6S">
  <Period id="live" start="PT0S">
    <AdaptationSet mimeType="video/mp4">
      <SegmentTemplate timescale="90000" duration="180000" media="live/$RepresentationID$/$Number$.m4s" startNumber="1"/>
      <Representation id="live-v" bandwidth="500000"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const LIST_MPD: &str = r#"<MPD type="static" mediaPresentationDuration="PT6S">
  <Period>
    <AdaptationSet mimeType="video/mp4">
      <Representation id="l1" bandwidth="1">
        <BaseURL>http://list.example.com/</BaseURL>
        <SegmentList timescale="10" duration="20">
          <Initialization sourceURL="init.mp4"/>
          <SegmentURL media="s1.m4s" mediaRange="0-99"/>
          <SegmentURL media="s2.m4s"/>
          <SegmentURL media="s3.m4s"/>
        </SegmentList>
      </Representation>
      <Representation id="b1" bandwidth="2">
        <BaseURL>http://base.example.com/file.mp4</BaseURL>
        <SegmentBase indexRange="100-200"/>
      </Representation>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const OPEN_REPEAT_MPD: &str = r#"<MPD type="static" mediaPresentationDuration="PT10S">
  <Period>
    <AdaptationSet mimeType="video/mp4">
      <SegmentTemplate media="t-$Time$.m4s">
        <SegmentTimeline>
          <S t="0" d="2" r="-1"/>
        </SegmentTimeline>
      </SegmentTemplate>
      <Representation id="r1" bandwidth="1"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const FINITE_LIVE_MPD: &str = r#"<MPD type="dynamic" availabilityStartTime="2024-01-01T00:00:00Z" mediaPresentationDuration="PT3600S">
  <Period id="event">
    <AdaptationSet mimeType="video/mp4">
      <SegmentTemplate duration="2" media="ev-$Number$.m4s"/>
      <Representation id="ev" bandwidth="1"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const LIVE_TIMELINE_MPD: &str = r#"<MPD type="dynamic" availabilityStartTime="2024-01-01T00:00:00Z" timeShiftBufferDepth="PT60S">
  <Period id="tl" start="PT0S">
    <AdaptationSet mimeType="video/mp4">
      <SegmentTemplate media="tl-$Time$.m4s">
        <SegmentTimeline>
          <S t="0" d="10" r="14"/>
        </SegmentTimeline>
      </SegmentTemplate>
      <Representation id="tl-v" bandwidth="1"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub const CAPPED_TIMELINE_MPD: &str = r#"<MPD type="static" mediaPresentationDuration="PT20S" maxSegmentDuration="PT2S">
  <Period>
    <AdaptationSet mimeType="video/mp4">
      <SegmentTemplate timescale="1000" media="c-$Time$.m4s">
        <SegmentTimeline>
          <S t="0" d="5000" r="1"/>
        </SegmentTimeline>
      </SegmentTemplate>
      <Representation id="c1" bandwidth="1"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

pub fn availability_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// 100 seconds into the live presentation.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 40).unwrap()
}

pub fn fixed_clock() -> Clock {
    Arc::new(now)
}

pub fn parser() -> DashParser {
    DashParser::with_clock(fixed_clock())
}

pub fn parse(text: &str) -> Manifest {
    parser().parse(text).unwrap()
}

pub fn rep<'a>(manifest: &'a Manifest, id: &str) -> RepresentationRef<'a> {
    manifest.find_representation(id).unwrap()
}
