//! Track title clean-up
//!
//! Titles scraped from admin pages and ICY blocks regularly arrive with HTML
//! entities or as UTF-8 that was decoded as Latin-1 somewhere upstream.

/// Normalize a raw track title.
///
/// Decodes HTML entities, repairs Latin-1 mojibake, then trims.
pub fn fix_track_title(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let repaired = repair_mojibake(&decoded).unwrap_or(decoded);
    repaired.trim().to_string()
}

/// Decode named (`&amp;` etc.) and numeric (`&#39;`, `&#x27;`) entities.
///
/// Unknown or malformed entities are left as-is.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Re-decode text whose UTF-8 bytes were read as Latin-1.
///
/// Returns `None` when the text is plain ASCII, contains chars above U+00FF,
/// or the reinterpreted bytes are not valid UTF-8.
fn repair_mojibake(s: &str) -> Option<String> {
    if s.is_ascii() {
        return None;
    }
    let bytes = s
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
