//! Shared utility functions.

use std::borrow::Cow;

/// Decode raw input bytes to a string.
///
/// Tries UTF-8 first (handles a BOM automatically via encoding_rs), then
/// falls back to Windows-1252, which is what most pre-UTF-8 email template
/// exports actually are. Uses `Cow<str>` to avoid allocation when the input
/// is already valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    let (result, _encoding, _malformed) = encoding_rs::WINDOWS_1252.decode(bytes);
    Cow::Owned(result.into_owned())
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
