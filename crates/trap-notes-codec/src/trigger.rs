// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoding/encoding of the `{!traptrigger ...}` block.

use crate::bools::{parse_on_off, render_on_off};
use crate::error::NotesCodecError;
use trap_domain::{CheckSpec, PositionMode, TrapConfig, TrapType};

/// Keys recognized inside the trigger block; anything else is preserved
/// verbatim as an unrecognized entry by the caller (see `notes.rs`).
pub const KNOWN_KEYS: &[&str] = &[
    "type", "uses", "armed", "primary", "opt2", "opt3", "success", "failure", "check1type",
    "check1dc", "check2type", "check2dc", "movetrig", "auto", "position",
];

fn parse_int(key: &str, value: &str) -> Result<i32, NotesCodecError> {
    value.parse().map_err(|_| NotesCodecError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_uint(key: &str, value: &str) -> Result<u32, NotesCodecError> {
    value.parse().map_err(|_| NotesCodecError::InvalidInteger {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Builds a [`TrapConfig`] (trigger fields only; `detection` left `None`)
/// from an ordered list of `key:[value]` pairs.
pub fn decode(pairs: &[(String, String)]) -> Result<TrapConfig, NotesCodecError> {
    let mut config = TrapConfig::default();

    for (key, value) in pairs {
        match key.as_str() {
            "type" => {
                config.trap_type = match value.as_str() {
                    "standard" => TrapType::Standard,
                    "interaction" => TrapType::Interaction,
                    other => {
                        return Err(NotesCodecError::InvalidBoolean {
                            key: "type".to_string(),
                            value: other.to_string(),
                        })
                    }
                };
            }
            "uses" => {
                let (current_str, max_str) = value
                    .split_once('/')
                    .ok_or_else(|| NotesCodecError::MalformedEntry(value.clone()))?;
                config.current_uses = Some(parse_uint("uses.current", current_str)?);
                config.max_uses = Some(parse_uint("uses.max", max_str)?);
            }
            "armed" => config.is_armed = Some(parse_on_off("armed", value)?),
            "primary" => config.primary_macro = Some(value.clone()),
            "opt2" => set_option(&mut config.options, 0, value),
            "opt3" => set_option(&mut config.options, 1, value),
            "success" => config.success_macro = Some(value.clone()),
            "failure" => config.failure_macro = Some(value.clone()),
            "check1type" => set_check_field(&mut config.checks, 0, value, None),
            "check1dc" => set_check_field(&mut config.checks, 0, "", Some(parse_int("check1dc", value)?)),
            "check2type" => set_check_field(&mut config.checks, 1, value, None),
            "check2dc" => set_check_field(&mut config.checks, 1, "", Some(parse_int("check2dc", value)?)),
            "movetrig" => config.movement_trigger = parse_on_off("movetrig", value)?,
            "auto" => config.auto_trigger = parse_on_off("auto", value)?,
            "position" => config.position = parse_position(value)?,
            _ => {} // unrecognized keys handled by the caller for round-trip preservation
        }
    }

    if let (Some(current), Some(max)) = (config.current_uses, config.max_uses) {
        if current > max {
            return Err(NotesCodecError::InvariantViolation(format!(
                "current_uses ({current}) > max_uses ({max})"
            )));
        }
    }

    Ok(config)
}

fn set_option(options: &mut Vec<String>, index: usize, value: &str) {
    while options.len() <= index {
        options.push(String::new());
    }
    options[index] = value.to_string();
}

fn set_check_field(checks: &mut Vec<CheckSpec>, index: usize, skill: &str, dc: Option<i32>) {
    while checks.len() <= index {
        checks.push(CheckSpec {
            skill_type: String::new(),
            dc: 0,
        });
    }
    if !skill.is_empty() {
        checks[index].skill_type = skill.to_string();
    }
    if let Some(dc) = dc {
        checks[index].dc = dc;
    }
}

fn parse_position(value: &str) -> Result<PositionMode, NotesCodecError> {
    match value {
        "intersection" => Ok(PositionMode::Intersection),
        "center" => Ok(PositionMode::Center),
        other => {
            let (x_str, y_str) = other
                .split_once(',')
                .ok_or_else(|| NotesCodecError::MalformedEntry(other.to_string()))?;
            let cell_x = parse_int("position.cellX", x_str)?;
            let cell_y = parse_int("position.cellY", y_str)?;
            Ok(PositionMode::Fixed { cell_x, cell_y })
        }
    }
}

/// A single rendered output pair: key, value body (unquoted), and whether
/// the value should be wrapped in double quotes on emit.
pub struct OutPair {
    /// The note key.
    pub key: &'static str,
    /// The unquoted rendered value.
    pub value: String,
    /// Whether the value needs quoting (free text that may contain spaces).
    pub quote: bool,
}

/// Renders the trigger-block fields of `config` that are set (non-default),
/// in a stable, documented order.
#[must_use]
pub fn encode(config: &TrapConfig) -> Vec<OutPair> {
    let mut out = Vec::new();
    out.push(OutPair {
        key: "type",
        value: match config.trap_type {
            TrapType::Standard => "standard".to_string(),
            TrapType::Interaction => "interaction".to_string(),
        },
        quote: false,
    });

    if config.current_uses.is_some() || config.max_uses.is_some() {
        out.push(OutPair {
            key: "uses",
            value: format!(
                "{}/{}",
                config.current_uses.unwrap_or(0),
                config.max_uses.unwrap_or(0)
            ),
            quote: false,
        });
    }
    if let Some(armed) = config.is_armed {
        out.push(OutPair {
            key: "armed",
            value: render_on_off(armed).to_string(),
            quote: false,
        });
    }
    if let Some(primary) = &config.primary_macro {
        out.push(OutPair {
            key: "primary",
            value: primary.clone(),
            quote: true,
        });
    }
    if let Some(opt2) = config.options.first() {
        out.push(OutPair {
            key: "opt2",
            value: opt2.clone(),
            quote: true,
        });
    }
    if let Some(opt3) = config.options.get(1) {
        out.push(OutPair {
            key: "opt3",
            value: opt3.clone(),
            quote: true,
        });
    }
    if let Some(success) = &config.success_macro {
        out.push(OutPair {
            key: "success",
            value: success.clone(),
            quote: true,
        });
    }
    if let Some(failure) = &config.failure_macro {
        out.push(OutPair {
            key: "failure",
            value: failure.clone(),
            quote: true,
        });
    }
    if let Some(check) = config.checks.first() {
        out.push(OutPair { key: "check1type", value: check.skill_type.clone(), quote: true });
        out.push(OutPair { key: "check1dc", value: check.dc.to_string(), quote: false });
    }
    if let Some(check) = config.checks.get(1) {
        out.push(OutPair { key: "check2type", value: check.skill_type.clone(), quote: true });
        out.push(OutPair { key: "check2dc", value: check.dc.to_string(), quote: false });
    }
    if !config.movement_trigger {
        out.push(OutPair {
            key: "movetrig",
            value: render_on_off(false).to_string(),
            quote: false,
        });
    }
    if config.auto_trigger {
        out.push(OutPair {
            key: "auto",
            value: render_on_off(true).to_string(),
            quote: false,
        });
    }
    match config.position {
        PositionMode::Intersection => {}
        PositionMode::Center => out.push(OutPair {
            key: "position",
            value: "center".to_string(),
            quote: false,
        }),
        PositionMode::Fixed { cell_x, cell_y } => out.push(OutPair {
            key: "position",
            value: format!("{cell_x},{cell_y}"),
            quote: false,
        }),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_then_encode_round_trips_standard_trap() {
        let original = TrapConfig {
            trap_type: TrapType::Standard,
            current_uses: Some(1),
            max_uses: Some(1),
            is_armed: Some(true),
            primary_macro: Some("#Explode".to_string()),
            auto_trigger: true,
            ..Default::default()
        };
        let pairs: Vec<(String, String)> = encode(&original)
            .into_iter()
            .map(|p| (p.key.to_string(), p.value))
            .collect();
        let decoded = decode(&pairs).expect("decodes");
        assert_eq!(decoded, original);
    }

    #[test]
    fn invariant_violation_is_rejected() {
        let pairs = vec![("uses".to_string(), "5/2".to_string())];
        assert!(matches!(
            decode(&pairs),
            Err(NotesCodecError::InvariantViolation(_))
        ));
    }
}
