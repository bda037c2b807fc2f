// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoding/encoding of the `{!trapdetection ...}` block.

use crate::bools::{parse_on_off, parse_true_false, render_on_off, render_true_false};
use crate::error::NotesCodecError;
use crate::trigger::OutPair;
use trap_domain::{parse_die_notation, DetectionConfig};

fn parse_int(key: &str, value: &str) -> Result<i32, NotesCodecError> {
    value.parse().map_err(|_| NotesCodecError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_float(key: &str, value: &str) -> Result<f64, NotesCodecError> {
    value.parse().map_err(|_| NotesCodecError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Builds a [`DetectionConfig`] from an ordered list of `key:[value]` pairs.
pub fn decode(pairs: &[(String, String)]) -> Result<DetectionConfig, NotesCodecError> {
    let mut config = DetectionConfig::default();

    for (key, value) in pairs {
        match key.as_str() {
            "dc" => config.passive_spot_dc = Some(parse_int("dc", value)?),
            "range" => config.passive_max_range = Some(parse_float("range", value)?),
            "noticeplayer" => config.passive_notice_player = Some(value.clone()),
            "noticegm" => config.passive_notice_gm = Some(value.clone()),
            "barfallback" => config.pp_token_bar_fallback = Some(value.clone()),
            "luck" => config.enable_luck_roll = parse_true_false("luck", value)?,
            "luckdie" => {
                config.luck_roll_die = Some(
                    parse_die_notation(value)
                        .map_err(|_| NotesCodecError::InvalidInteger {
                            key: "luckdie".to_string(),
                            value: value.clone(),
                        })?,
                );
            }
            "aura" => config.show_detection_aura = parse_true_false("aura", value)?,
            "enabled" => config.passive_enabled = parse_true_false("enabled", value)?,
            // `detected` is the one documented `on`/`off` exception within
            // this otherwise `true`/`false` block.
            "detected" => config.detected = parse_on_off("detected", value)?,
            _ => {}
        }
    }

    Ok(config)
}

/// Whether a decoded [`DetectionConfig`] carries no meaningful settings, so
/// the whole block can be omitted on emit rather than round-tripped as an
/// empty `{!trapdetection}` tag.
#[must_use]
pub fn is_fully_disabled(config: &DetectionConfig) -> bool {
    config.passive_spot_dc.is_none()
        && config.passive_max_range.is_none()
        && config.passive_notice_player.is_none()
        && config.passive_notice_gm.is_none()
        && config.pp_token_bar_fallback.is_none()
        && !config.enable_luck_roll
        && config.luck_roll_die.is_none()
        && !config.show_detection_aura
        && config.passive_enabled
        && !config.detected
}

/// Renders the set (non-default) fields of `config`, or `None` if
/// [`is_fully_disabled`] holds.
#[must_use]
pub fn encode(config: &DetectionConfig) -> Option<Vec<OutPair>> {
    if is_fully_disabled(config) {
        return None;
    }

    let mut out = Vec::new();
    if let Some(dc) = config.passive_spot_dc {
        out.push(OutPair { key: "dc", value: dc.to_string(), quote: false });
    }
    if let Some(range) = config.passive_max_range {
        out.push(OutPair { key: "range", value: range.to_string(), quote: false });
    }
    if let Some(notice) = &config.passive_notice_player {
        out.push(OutPair { key: "noticeplayer", value: notice.clone(), quote: true });
    }
    if let Some(notice) = &config.passive_notice_gm {
        out.push(OutPair { key: "noticegm", value: notice.clone(), quote: true });
    }
    if let Some(bar) = &config.pp_token_bar_fallback {
        out.push(OutPair { key: "barfallback", value: bar.clone(), quote: true });
    }
    if config.enable_luck_roll {
        out.push(OutPair {
            key: "luck",
            value: render_true_false(true).to_string(),
            quote: false,
        });
    }
    if let Some(die) = config.luck_roll_die {
        out.push(OutPair { key: "luckdie", value: die.to_string(), quote: false });
    }
    if config.show_detection_aura {
        out.push(OutPair {
            key: "aura",
            value: render_true_false(true).to_string(),
            quote: false,
        });
    }
    if !config.passive_enabled {
        out.push(OutPair {
            key: "enabled",
            value: render_true_false(false).to_string(),
            quote: false,
        });
    }
    if config.detected {
        out.push(OutPair {
            key: "detected",
            value: render_on_off(true).to_string(),
            quote: false,
        });
    }

    Some(out)
}
