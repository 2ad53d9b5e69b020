//! Coercion of raw attribute text into [`TypedValue`]s.
//!
//! The matchers are tried in a fixed order and the first one whose `test` accepts the
//! value wins. `String` accepts everything and therefore has to stay last: anywhere
//! earlier it would swallow durations, dates and numbers alike.

use crate::mpd::tree::TypedValue;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

const SECONDS_IN_YEAR: f64 = 365.0 * 24.0 * 60.0 * 60.0;
const SECONDS_IN_MONTH: f64 = 30.0 * 24.0 * 60.0 * 60.0;
const SECONDS_IN_DAY: f64 = 24.0 * 60.0 * 60.0;
const SECONDS_IN_HOUR: f64 = 60.0 * 60.0;
const SECONDS_IN_MIN: f64 = 60.0;

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?P(?:([\d.]+)Y)?(?:([\d.]+)M)?(?:([\d.]+)D)?(?:T(?:([\d.]+)H)?(?:([\d.]+)M)?(?:([\d.]+)S)?)?$")
        .expect("duration pattern is valid")
});

static DATE_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2})(?::(\d{2})(?:\.(\d+))?)?(Z|([+-])(\d{2}):?(\d{2}))?$")
        .expect("date-time pattern is valid")
});

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?[0-9]+[.]?[0-9]*([eE][-+]?[0-9]+)?$").expect("numeric pattern is valid")
});

/// Attributes carrying an `xs:duration`.
const DURATION_ATTRIBUTES: &[&str] = &[
    "mediaPresentationDuration",
    "minimumUpdatePeriod",
    "timeShiftBufferDepth",
    "maxSegmentDuration",
    "maxSubsegmentDuration",
    "minBufferTime",
    "suggestedPresentationDelay",
    "start",
    "duration",
];

/// Attributes carrying an `xs:dateTime`.
const DATE_TIME_ATTRIBUTES: &[&str] = &["availabilityStartTime", "availabilityEndTime", "publishTime"];

/// Attributes that look numeric in practice but are identifiers or templates.
const STRING_ATTRIBUTES: &[&str] = &[
    "id",
    "codecs",
    "mimeType",
    "contentType",
    "lang",
    "profiles",
    "media",
    "initialization",
    "index",
    "indexRange",
    "mediaRange",
    "range",
    "sourceURL",
    "schemeIdUri",
    "value",
    "sar",
    "frameRate",
    "segmentProfiles",
    "scanType",
    "serviceLocation",
];

/// One coercion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    Duration,
    DateTime,
    Numeric,
    String,
}

impl Matcher {
    /// Priority order. `String` is the catch-all and must remain the final entry.
    pub const PRIORITY: [Matcher; 4] = [Matcher::Duration, Matcher::DateTime, Matcher::Numeric, Matcher::String];

    /// Whether this matcher claims `raw`, the text of attribute `attribute`.
    pub fn test(self, attribute: &str, raw: &str) -> bool {
        match self {
            Matcher::Duration => DURATION_ATTRIBUTES.contains(&attribute) && parse_duration(raw).is_some(),
            Matcher::DateTime => DATE_TIME_ATTRIBUTES.contains(&attribute) && DATE_TIME_REGEX.is_match(raw),
            Matcher::Numeric => !STRING_ATTRIBUTES.contains(&attribute) && NUMERIC_REGEX.is_match(raw),
            Matcher::String => true,
        }
    }

    /// Converts `raw`. Only called right after `test` accepted the same value; should the
    /// conversion still fail (a date of February 31st) the text is kept as a string.
    pub fn coerce(self, raw: &str) -> TypedValue {
        let coerced = match self {
            Matcher::Duration => parse_duration(raw).map(TypedValue::Duration),
            Matcher::DateTime => parse_date_time(raw).map(TypedValue::DateTime),
            Matcher::Numeric => parse_numeric(raw),
            Matcher::String => None,
        };
        coerced.unwrap_or_else(|| TypedValue::String(raw.to_string()))
    }
}

/// Runs `raw` through `matchers` in order and returns the first successful coercion.
pub fn coerce_attribute(matchers: &[Matcher], attribute: &str, raw: &str) -> TypedValue {
    matchers
        .iter()
        .find(|m| m.test(attribute, raw))
        .map(|m| m.coerce(raw))
        .unwrap_or_else(|| TypedValue::String(raw.to_string()))
}

/// Parses an ISO-8601 duration into seconds.
pub fn parse_duration(raw: &str) -> Option<f64> {
    let caps = DURATION_REGEX.captures(raw)?;
    // "P" and "PT" match the pattern but carry no component.
    if (2..=7).all(|i| caps.get(i).is_none()) {
        return None;
    }
    let component = |i: usize, unit: f64| -> Option<f64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<f64>().ok().map(|v| v * unit),
            None => Some(0.0),
        }
    };
    let seconds = component(2, SECONDS_IN_YEAR)?
        + component(3, SECONDS_IN_MONTH)?
        + component(4, SECONDS_IN_DAY)?
        + component(5, SECONDS_IN_HOUR)?
        + component(6, SECONDS_IN_MIN)?
        + component(7, 1.0)?;
    Some(if caps.get(1).is_some() { -seconds } else { seconds })
}

/// Parses an `xs:dateTime`. A missing zone designator means UTC.
pub fn parse_date_time(raw: &str) -> Option<DateTime<Utc>> {
    let caps = DATE_TIME_REGEX.captures(raw)?;
    let field = |i: usize| -> Option<u32> { caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok()) };

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let nanos = match caps.get(7) {
        Some(m) => {
            let digits: String = m.as_str().chars().chain(std::iter::repeat('0')).take(9).collect();
            digits.parse::<u32>().ok()?
        }
        None => 0,
    };
    let naive = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_nano_opt(field(4)?, field(5)?, field(6)?, nanos)?;

    let offset_seconds = match caps.get(9) {
        Some(sign) => {
            let seconds = (field(10)? * 3600 + field(11)? * 60) as i32;
            if sign.as_str() == "-" { -seconds } else { seconds }
        }
        None => 0,
    };
    let offset = FixedOffset::east_opt(offset_seconds)?;
    offset.from_local_datetime(&naive).single().map(|dt| dt.with_timezone(&Utc))
}

fn parse_numeric(raw: &str) -> Option<TypedValue> {
    let integral = !raw.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(v) = raw.parse::<i64>() {
            return Some(TypedValue::Integer(v));
        }
    }
    raw.parse::<f64>().ok().map(TypedValue::Number)
}
