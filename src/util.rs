//! Text decoding helpers for rendered pages.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<meta charset>` or `<?xml encoding>`)
/// 3. Falls back to Windows-1252 (common in legacy HTML)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    // Try UTF-8 first (handles BOM automatically)
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    // If UTF-8 failed, try the hint encoding
    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    // Fallback: Windows-1252 (superset of ISO-8859-1)
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Find a declared character encoding near the start of a page.
///
/// Recognizes `<meta charset="...">`, the `charset=` parameter of a
/// `<meta http-equiv>` content type, and `<?xml encoding="..."?>`.
pub fn sniff_charset(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(1024)];

    for marker in [&b"charset="[..], &b"encoding="[..]] {
        let Some(pos) = prefix
            .windows(marker.len())
            .position(|w| w.eq_ignore_ascii_case(marker))
        else {
            continue;
        };
        let rest = &prefix[pos + marker.len()..];
        let rest = match rest.first() {
            Some(b'"' | b'\'') => &rest[1..],
            Some(_) => rest,
            None => continue,
        };
        let len = rest
            .iter()
            .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'>' | b'/') || b.is_ascii_whitespace())
            .unwrap_or(rest.len());
        if len > 0 {
            return std::str::from_utf8(&rest[..len]).ok();
        }
    }

    None
}
