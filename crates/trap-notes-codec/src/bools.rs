// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Boolean encodings used by the two note blocks: `on|off` (trigger block,
//! and the one documented `detected:[on]` exception in the detection block)
//! vs. `true|false` (the rest of the detection block).

use crate::error::NotesCodecError;

/// Parses `on`/`off`.
pub fn parse_on_off(key: &str, value: &str) -> Result<bool, NotesCodecError> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(NotesCodecError::InvalidBoolean {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Renders a boolean as `on`/`off`.
#[must_use]
pub fn render_on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Parses `true`/`false`.
pub fn parse_true_false(key: &str, value: &str) -> Result<bool, NotesCodecError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(NotesCodecError::InvalidBoolean {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Renders a boolean as `true`/`false`.
#[must_use]
pub fn render_true_false(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
