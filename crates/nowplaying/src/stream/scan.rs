//! Raw response scanning
//!
//! The ICY engine never parses the server response as HTTP. It looks for a
//! handful of literal markers in the decoded text instead, which works for
//! Shoutcast `ICY 200 OK` replies, Icecast HTTP replies and the odd
//! half-broken server in between.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

const TITLE_MARKER: &str = "StreamTitle=";
const TITLE_TERMINATOR: &str = "';";
const HTML_MARKER: &str = "Content-Type: text/html";

/// Extract the raw `StreamTitle` value from the buffer.
///
/// Looks for `StreamTitle=` and then for the first `';` at or after it. The
/// character right after `=` (the opening quote) is skipped.
pub fn extract_title(buffer: &str) -> Option<&str> {
    let start = buffer.find(TITLE_MARKER)?;
    let end = start + buffer[start..].find(TITLE_TERMINATOR)?;
    if end <= start {
        return None;
    }

    let title_start = start + TITLE_MARKER.len();
    let title_start = buffer[title_start..]
        .chars()
        .next()
        .map_or(title_start, |quote| title_start + quote.len_utf8());
    if title_start >= end {
        return Some("");
    }
    Some(&buffer[title_start..end])
}

/// Collect ICY and content-type header lines.
///
/// A line qualifies if it contains `icy` and a colon, or mentions
/// `content-type` in any case. Only lines splitting into exactly one key and
/// one value on `:` are kept; keys are lowercased.
pub fn extract_headers(buffer: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    for line in buffer.split('\n') {
        let icy = line.contains("icy") && line.contains(':');
        if !icy && !line.to_lowercase().contains("content-type") {
            continue;
        }

        let parts: Vec<&str> = line.trim().split(':').collect();
        if let [key, value] = parts.as_slice() {
            headers.insert(key.to_lowercase(), value.trim().to_string());
        }
    }

    headers
}

/// Redirect target from the first `Location:` line, if any
pub fn find_redirect(buffer: &str) -> Option<&str> {
    static LOCATION: OnceLock<Option<Regex>> = OnceLock::new();
    let re = LOCATION
        .get_or_init(|| Regex::new(r"(?mi)Location: (.*)").ok())
        .as_ref()?;

    let target = re.captures(buffer)?.get(1)?.as_str().trim_end();
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

/// Whether the server answered with an HTML page
pub fn is_html_error_page(buffer: &str) -> bool {
    buffer.contains(HTML_MARKER)
}
