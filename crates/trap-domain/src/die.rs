// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Die notation (`NdM`) used by the passive sensor's luck roll.

use std::fmt;

/// A parsed `NdM` die notation, e.g. `1d4` or `2d6`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DieRoll {
    /// Number of dice to roll.
    pub count: u32,
    /// Number of sides per die.
    pub sides: u32,
}

impl DieRoll {
    /// Builds a die roll from components.
    #[must_use]
    pub const fn new(count: u32, sides: u32) -> Self {
        Self { count, sides }
    }
}

impl fmt::Display for DieRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

/// Error returned when a die notation string fails to parse.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid die notation: {0}")]
pub struct DieParseError(pub String);

/// Parses `NdM` die notation (e.g. `"1d4"`). Tolerates a missing count,
/// treating `"d20"` as `1d20`.
pub fn parse_die_notation(s: &str) -> Result<DieRoll, DieParseError> {
    let trimmed = s.trim();
    let Some(d_pos) = trimmed.find(['d', 'D']) else {
        return Err(DieParseError(s.to_string()));
    };
    let (count_str, sides_str) = trimmed.split_at(d_pos);
    let sides_str = &sides_str[1..];

    let count = if count_str.is_empty() {
        1
    } else {
        count_str
            .parse::<u32>()
            .map_err(|_| DieParseError(s.to_string()))?
    };
    let sides = sides_str
        .parse::<u32>()
        .map_err(|_| DieParseError(s.to_string()))?;

    if count == 0 || sides == 0 {
        return Err(DieParseError(s.to_string()));
    }

    Ok(DieRoll::new(count, sides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counted_notation() {
        assert_eq!(parse_die_notation("2d6").unwrap(), DieRoll::new(2, 6));
    }

    #[test]
    fn parses_implicit_single_die() {
        assert_eq!(parse_die_notation("d20").unwrap(), DieRoll::new(1, 20));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_die_notation("not-a-die").is_err());
        assert!(parse_die_notation("1d0").is_err());
        assert!(parse_die_notation("0d6").is_err());
    }
}
