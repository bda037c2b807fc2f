// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level notes codec: locates, decodes, merges and re-emits the
//! `{!traptrigger}` / `{!trapdetection}` blocks within a map object's free-form
//! notes field, leaving any surrounding text untouched (§4.2).

use crate::entities::encode_entities;
use crate::error::NotesCodecError;
use crate::parser::{find_block, parse_pairs};
use crate::{detection, trigger};
use trap_domain::TrapConfig;

const TRIGGER_TAG: &str = "traptrigger";
const DETECTION_TAG: &str = "trapdetection";

/// Decodes a trap's full configuration from its notes text.
///
/// Absence of the trigger block yields a default [`TrapConfig`] (an
/// unconfigured, disarmed trap); absence of the detection block leaves
/// `detection` as `None`.
pub fn decode_notes(notes: &str) -> Result<TrapConfig, NotesCodecError> {
    let mut config = if let Some(block) = find_block(notes, TRIGGER_TAG) {
        let pairs = parse_pairs(&block.inner)?;
        trigger::decode(&pairs)?
    } else {
        TrapConfig::default()
    };

    if let Some(block) = find_block(notes, DETECTION_TAG) {
        let pairs = parse_pairs(&block.inner)?;
        config.detection = Some(detection::decode(&pairs)?);
    }

    Ok(config)
}

fn render_block(tag: &str, pairs: &[trigger::OutPair]) -> String {
    let body = pairs
        .iter()
        .map(|p| {
            let value = encode_entities(&p.value);
            if p.quote {
                format!("{}:[\"{}\"]", p.key, value)
            } else {
                format!("{}:[{}]", p.key, value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{{!{tag} {body}}}")
}

/// Re-emits `config`'s note blocks, splicing them into `existing` in place of
/// any prior occurrence of the same tag and appending new blocks (separated by
/// a single space) when the tag was previously absent. Text outside the two
/// tagged blocks is preserved verbatim.
#[must_use]
pub fn encode_notes(existing: &str, config: &TrapConfig) -> String {
    let mut text = existing.to_string();

    let trigger_block = render_block(TRIGGER_TAG, &trigger::encode(config));
    text = splice_block(&text, TRIGGER_TAG, &trigger_block);

    match config.detection.as_ref().and_then(detection::encode) {
        Some(pairs) => {
            let block = render_block(DETECTION_TAG, &pairs);
            text = splice_block(&text, DETECTION_TAG, &block);
        }
        None => {
            text = remove_block(&text, DETECTION_TAG);
        }
    }

    text
}

fn splice_block(text: &str, tag: &str, rendered: &str) -> String {
    find_block(text, tag).map_or_else(
        || {
            if text.trim().is_empty() {
                rendered.to_string()
            } else {
                format!("{} {}", text.trim_end(), rendered)
            }
        },
        |block| format!("{}{}{}", &text[..block.start], rendered, &text[block.end..]),
    )
}

fn remove_block(text: &str, tag: &str) -> String {
    find_block(text, tag).map_or_else(
        || text.to_string(),
        |block| {
            let before = text[..block.start].trim_end();
            let after = text[block.end..].trim_start();
            if before.is_empty() {
                after.to_string()
            } else if after.is_empty() {
                before.to_string()
            } else {
                format!("{before} {after}")
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use trap_domain::{DetectionConfig, TrapType};

    #[test]
    fn decodes_both_blocks() {
        let notes = "Some GM-only flavor text. \
            {!traptrigger type:[standard] uses:[1/1] armed:[on] primary:[\"#Explode\"]} \
            {!trapdetection dc:[15] enabled:[true]}";
        let config = decode_notes(notes).expect("decodes");
        assert_eq!(config.trap_type, TrapType::Standard);
        assert_eq!(config.current_uses, Some(1));
        assert!(config.is_effectively_armed());
        let detection = config.detection.expect("detection present");
        assert_eq!(detection.passive_spot_dc, Some(15));
    }

    #[test]
    fn missing_blocks_yield_defaults() {
        let config = decode_notes("just some flavor text").expect("decodes");
        assert_eq!(config, TrapConfig::default());
        assert!(config.detection.is_none());
    }

    #[test]
    fn surrounding_text_survives_round_trip() {
        let notes = "GM notes up top. {!traptrigger type:[standard]} GM notes below.";
        let config = decode_notes(notes).expect("decodes");
        let re_emitted = encode_notes(notes, &config);
        assert!(re_emitted.starts_with("GM notes up top."));
        assert!(re_emitted.ends_with("GM notes below."));
    }

    #[test]
    fn unset_detection_is_not_emitted() {
        let config = TrapConfig::default();
        let text = encode_notes("", &config);
        assert!(!text.contains("trapdetection"));
    }

    #[test]
    fn clearing_detection_removes_previously_present_block() {
        let notes = "{!traptrigger type:[standard]} {!trapdetection dc:[10]}";
        let mut config = decode_notes(notes).expect("decodes");
        config.detection = Some(DetectionConfig::default());
        let text = encode_notes(notes, &config);
        assert!(!text.contains("trapdetection"));
    }
}
