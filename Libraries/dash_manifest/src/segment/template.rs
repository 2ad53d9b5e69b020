//! `$Identifier$` substitution in SegmentTemplate URLs.
//!
//! Identifiers may carry a printf-style format tag, `$Number%05d$`. The supported
//! specifiers are the integer ones of IEEE 1003.1: `d`, `i`, `u`, `x`, `X` and `o`.
//! `$$` is an escaped dollar and only collapses once every identifier is substituted.

use tracing::debug;

const FORMAT_TAG: &str = "%0";
const REPRESENTATION_ID_TOKEN: &str = "$RepresentationID$";

/// Left-pads `digits` with zeros up to `width` characters. Never truncates.
fn zero_pad_to_length(digits: String, width: usize) -> String {
    if digits.len() >= width {
        return digits;
    }
    format!("{}{}", "0".repeat(width - digits.len()), digits)
}

/// Leading decimal digits of `s`, 0 when there are none.
fn parse_width(s: &str) -> usize {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

/// Replaces every `$<token>$` / `$<token>%0<width><specifier>$` in `url` with `value`.
///
/// A `$<token>` without a closing `$`, or with a specifier outside the supported set,
/// stops the substitution and the URL is returned as it stands.
pub fn replace_token_for_template(url: &str, token: &str, value: u64) -> String {
    let mut url = url.to_string();
    let opening = format!("${}", token);

    loop {
        let Some(start) = url.find(&opening) else {
            return url;
        };
        let after_token = start + opening.len();

        let Some(end) = url[after_token..].find('$').map(|p| p + after_token) else {
            return url;
        };

        let replacement = match url[after_token..end].find(FORMAT_TAG).map(|p| p + after_token) {
            Some(tag) => {
                let specifier = url.as_bytes()[end - 1];
                let width = url.get(tag + FORMAT_TAG.len()..end - 1).map(parse_width).unwrap_or(0);
                match specifier {
                    b'd' | b'i' | b'u' => zero_pad_to_length(value.to_string(), width),
                    b'x' => zero_pad_to_length(format!("{:x}", value), width),
                    b'X' => zero_pad_to_length(format!("{:X}", value), width),
                    b'o' => zero_pad_to_length(format!("{:o}", value), width),
                    _ => {
                        debug!("Unsupported format specifier in template {}", url);
                        return url;
                    }
                }
            }
            None => value.to_string(),
        };

        url.replace_range(start..=end, &replacement);
    }
}

/// Collapses every `$$` into `$`.
pub fn unescape_dollars_in_template(url: &str) -> String {
    url.replace("$$", "$")
}

/// Substitutes `$RepresentationID$` literally, without format tags.
pub fn replace_id_for_template(url: &str, value: Option<&str>) -> String {
    match value {
        Some(id) if url.contains(REPRESENTATION_ID_TOKEN) => url.replace(REPRESENTATION_ID_TOKEN, id),
        _ => url.to_string(),
    }
}

/// Identifier values for one segment request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateValues<'a> {
    pub representation_id: Option<&'a str>,
    pub bandwidth: Option<u64>,
    pub number: Option<u64>,
    pub time: Option<u64>,
}

/// Resolves a complete media or initialization template.
pub fn resolve_segment_url(template: &str, values: &TemplateValues<'_>) -> String {
    let mut url = replace_id_for_template(template, values.representation_id);
    if let Some(bandwidth) = values.bandwidth {
        url = replace_token_for_template(&url, "Bandwidth", bandwidth);
    }
    if let Some(number) = values.number {
        url = replace_token_for_template(&url, "Number", number);
    }
    if let Some(time) = values.time {
        url = replace_token_for_template(&url, "Time", time);
    }
    unescape_dollars_in_template(&url)
}
