// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! HTML entity encode/decode for note values (`& < > " '`).

/// Decodes the five entities back to their literal characters.
///
/// `&amp;` is decoded last so that `&amp;lt;` round-trips to `&lt;` rather
/// than being double-unescaped into `<`.
#[must_use]
pub fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Encodes the five reserved characters as entities, in the order that makes
/// [`decode_entities`] its exact inverse (`&` first).
#[must_use]
pub fn encode_entities(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
