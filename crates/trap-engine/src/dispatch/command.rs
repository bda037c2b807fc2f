// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parsing of the `!trapsystem <verb> <args…>` chat command surface (§6).

use thiserror::Error;
use trap_domain::{CharacterId, PositionMode, TokenId, TrapId};

/// A parsed `!trapsystem` invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `setup uses primary [opt2] [opt3] [positionMode] [autoTrigger]`
    Setup {
        /// `current/max` uses.
        uses: (u32, u32),
        /// Primary action string.
        primary: String,
        /// Second option action string.
        opt2: Option<String>,
        /// Third option action string.
        opt3: Option<String>,
        /// Snap position mode.
        position: PositionMode,
        /// Whether auto-trigger is on.
        auto_trigger: bool,
    },
    /// `setupinteraction uses primary success failure check1Type check1DC [check2Type check2DC] moveTrig positionMode autoTrigger`
    SetupInteraction {
        /// `current/max` uses.
        uses: (u32, u32),
        /// Primary action string.
        primary: String,
        /// Action run on success.
        success: String,
        /// Action run on failure.
        failure: String,
        /// First configured check.
        check1: (String, i32),
        /// Second configured check, if present.
        check2: Option<(String, i32)>,
        /// Whether C5 considers this trap on movement.
        movement_trigger: bool,
        /// Snap position mode.
        position: PositionMode,
        /// Whether auto-trigger is on.
        auto_trigger: bool,
    },
    /// `toggle [trapId]`
    Toggle {
        /// Explicit trap id, or `None` for "selected".
        trap_id: Option<TrapId>,
    },
    /// `status [trapId]`
    Status {
        /// Explicit trap id, or `None` for "selected".
        trap_id: Option<TrapId>,
    },
    /// `trigger`
    Trigger,
    /// `allowmovement tokenId|selected`
    AllowMovement {
        /// Explicit token id, or `None` for "selected".
        token_id: Option<TokenId>,
    },
    /// `allowall`
    AllowAll,
    /// `ignoretraps`
    IgnoreTraps,
    /// `enable` / `disable`
    SetTriggersEnabled(bool),
    /// `interact`
    Interact,
    /// `allow`
    Allow,
    /// `fail`
    Fail,
    /// `check`
    Check,
    /// `customcheck skillType dc`
    CustomCheck {
        /// Skill name.
        skill_type: String,
        /// Difficulty class.
        dc: i32,
    },
    /// `rollcheck total [skillType] [characterId]`
    RollCheck {
        /// Rolled total.
        total: i32,
        /// Rolled skill name, if the roll carried one.
        skill_type: Option<String>,
        /// The character the roll was made for, if the roll carried one (§4.9).
        character_id: Option<CharacterId>,
    },
    /// `displaydc`
    DisplayDc,
    /// `setdc dc`
    SetDc {
        /// New difficulty class.
        dc: i32,
    },
    /// `selectcharacter characterId`
    SelectCharacter {
        /// The character to bind the pending check to.
        character_id: CharacterId,
    },
    /// `resolvemismatch [accept|reject]`
    ResolveMismatch {
        /// Whether the GM accepted the mismatched roll against the frozen DC,
        /// rather than overriding the expected skill for a future roll.
        accept: bool,
    },
    /// `marktriggered tokenId trapId primary|option N`
    MarkTriggered {
        /// The locked token.
        token_id: TokenId,
        /// The trap.
        trap_id: TrapId,
        /// Which action to run.
        which: MarkTriggeredTarget,
    },
    /// `setpassive property trapId value`
    SetPassive {
        /// The detection field to set.
        property: String,
        /// The trap to update.
        trap_id: TrapId,
        /// The raw value.
        value: String,
    },
    /// `passivemenu`
    PassiveMenu,
    /// `resetdetection [trapId]`
    ResetDetection {
        /// Explicit trap id, or `None` for "every trap".
        trap_id: Option<TrapId>,
    },
    /// `hidedetection [minutes]`
    HideDetection {
        /// Optional auto-expiry, in minutes.
        minutes: Option<u64>,
    },
    /// `showdetection`
    ShowDetection,
    /// `rearm trapId`
    Rearm {
        /// The trap to re-arm.
        trap_id: TrapId,
    },
}

/// Which action a `marktriggered` command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkTriggeredTarget {
    /// The trap's primary action.
    Primary,
    /// One of the trap's ordered options, by index (0-based).
    Option(usize),
}

/// Failure parsing a `!trapsystem` line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    /// The line did not start with the `!trapsystem` prefix.
    #[error("not a trapsystem command")]
    NotATrapsystemCommand,
    /// No verb followed the prefix.
    #[error("missing verb")]
    MissingVerb,
    /// The verb is not recognized.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),
    /// A required argument was missing.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    /// An argument could not be parsed as its expected type.
    #[error("invalid argument `{arg}` for {field}")]
    InvalidArgument {
        /// The field the argument was meant to fill.
        field: &'static str,
        /// The raw text that failed to parse.
        arg: String,
    },
}

const PREFIX: &str = "!trapsystem";

fn next<'a>(args: &mut impl Iterator<Item = &'a str>, field: &'static str) -> Result<&'a str, CommandParseError> {
    args.next().ok_or(CommandParseError::MissingArgument(field))
}

fn parse_uses(raw: &str) -> Result<(u32, u32), CommandParseError> {
    let (current, max) = raw.split_once('/').ok_or_else(|| CommandParseError::InvalidArgument {
        field: "uses",
        arg: raw.to_string(),
    })?;
    let current: u32 = current.parse().map_err(|_| CommandParseError::InvalidArgument {
        field: "uses.current",
        arg: current.to_string(),
    })?;
    let max: u32 = max.parse().map_err(|_| CommandParseError::InvalidArgument {
        field: "uses.max",
        arg: max.to_string(),
    })?;
    Ok((current, max))
}

fn parse_int(field: &'static str, raw: &str) -> Result<i32, CommandParseError> {
    raw.parse().map_err(|_| CommandParseError::InvalidArgument {
        field,
        arg: raw.to_string(),
    })
}

fn parse_bool(field: &'static str, raw: &str) -> Result<bool, CommandParseError> {
    match raw {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(CommandParseError::InvalidArgument {
            field,
            arg: other.to_string(),
        }),
    }
}

fn parse_position(raw: &str) -> Result<PositionMode, CommandParseError> {
    match raw {
        "intersection" => Ok(PositionMode::Intersection),
        "center" => Ok(PositionMode::Center),
        other => {
            let (x, y) = other.split_once(',').ok_or_else(|| CommandParseError::InvalidArgument {
                field: "positionMode",
                arg: other.to_string(),
            })?;
            Ok(PositionMode::Fixed {
                cell_x: parse_int("positionMode.cellX", x)?,
                cell_y: parse_int("positionMode.cellY", y)?,
            })
        }
    }
}

fn parse_token_or_selected(raw: &str) -> Option<TokenId> {
    if raw.eq_ignore_ascii_case("selected") {
        None
    } else {
        Some(TokenId::from(raw))
    }
}

/// Parses one `!trapsystem <verb> <args…>` chat line.
///
/// # Errors
///
/// Returns [`CommandParseError`] if the line is not a `!trapsystem` command,
/// names an unrecognized verb, or is missing/malforms a required argument.
pub fn parse_command(line: &str) -> Result<Command, CommandParseError> {
    let rest = line
        .trim()
        .strip_prefix(PREFIX)
        .ok_or(CommandParseError::NotATrapsystemCommand)?
        .trim();

    let mut parts = rest.split_whitespace();
    let verb = parts.next().ok_or(CommandParseError::MissingVerb)?;

    match verb {
        "setup" => {
            let uses = parse_uses(next(&mut parts, "uses")?)?;
            let primary = next(&mut parts, "primary")?.to_string();
            let rest: Vec<&str> = parts.collect();
            let opt2 = rest.first().filter(|s| !s.is_empty()).map(|s| (*s).to_string());
            let opt3 = rest.get(1).filter(|s| !s.is_empty()).map(|s| (*s).to_string());
            let position = rest.get(2).map_or(Ok(PositionMode::default()), |s| parse_position(s))?;
            let auto_trigger = rest.get(3).map_or(Ok(false), |s| parse_bool("autoTrigger", s))?;
            Ok(Command::Setup {
                uses,
                primary,
                opt2,
                opt3,
                position,
                auto_trigger,
            })
        }
        "setupinteraction" => {
            let uses = parse_uses(next(&mut parts, "uses")?)?;
            let primary = next(&mut parts, "primary")?.to_string();
            let success = next(&mut parts, "success")?.to_string();
            let failure = next(&mut parts, "failure")?.to_string();
            let check1_type = next(&mut parts, "check1Type")?.to_string();
            let check1_dc = parse_int("check1DC", next(&mut parts, "check1DC")?)?;
            let rest: Vec<&str> = parts.collect();
            let (check2, tail) = if rest.len() >= 2 && rest[1].parse::<i32>().is_ok() {
                (Some((rest[0].to_string(), parse_int("check2DC", rest[1])?)), &rest[2..])
            } else {
                (None, &rest[..])
            };
            let movement_trigger = tail.first().map_or(Ok(true), |s| parse_bool("moveTrig", s))?;
            let position = tail.get(1).map_or(Ok(PositionMode::default()), |s| parse_position(s))?;
            let auto_trigger = tail.get(2).map_or(Ok(false), |s| parse_bool("autoTrigger", s))?;
            Ok(Command::SetupInteraction {
                uses,
                primary,
                success,
                failure,
                check1: (check1_type, check1_dc),
                check2,
                movement_trigger,
                position,
                auto_trigger,
            })
        }
        "toggle" => Ok(Command::Toggle {
            trap_id: parts.next().map(TrapId::from),
        }),
        "status" => Ok(Command::Status {
            trap_id: parts.next().map(TrapId::from),
        }),
        "trigger" => Ok(Command::Trigger),
        "allowmovement" => Ok(Command::AllowMovement {
            token_id: parse_token_or_selected(next(&mut parts, "tokenId")?),
        }),
        "allowall" => Ok(Command::AllowAll),
        "ignoretraps" => Ok(Command::IgnoreTraps),
        "enable" => Ok(Command::SetTriggersEnabled(true)),
        "disable" => Ok(Command::SetTriggersEnabled(false)),
        "interact" => Ok(Command::Interact),
        "allow" => Ok(Command::Allow),
        "fail" => Ok(Command::Fail),
        "check" => Ok(Command::Check),
        "customcheck" => Ok(Command::CustomCheck {
            skill_type: next(&mut parts, "skillType")?.to_string(),
            dc: parse_int("dc", next(&mut parts, "dc")?)?,
        }),
        "rollcheck" => {
            let total = parse_int("total", next(&mut parts, "total")?)?;
            let skill_type = parts.next().map(str::to_string);
            let character_id = parts.next().map(CharacterId::from);
            Ok(Command::RollCheck { total, skill_type, character_id })
        }
        "displaydc" => Ok(Command::DisplayDc),
        "setdc" => Ok(Command::SetDc {
            dc: parse_int("dc", next(&mut parts, "dc")?)?,
        }),
        "selectcharacter" => Ok(Command::SelectCharacter {
            character_id: CharacterId::from(next(&mut parts, "characterId")?),
        }),
        "resolvemismatch" => Ok(Command::ResolveMismatch {
            accept: parts.next().is_some_and(|s| s.eq_ignore_ascii_case("accept")),
        }),
        "marktriggered" => {
            let token_id = TokenId::from(next(&mut parts, "tokenId")?);
            let trap_id = TrapId::from(next(&mut parts, "trapId")?);
            let target = next(&mut parts, "primary|option")?;
            let which = if target.eq_ignore_ascii_case("primary") {
                MarkTriggeredTarget::Primary
            } else {
                let index: usize = target.parse().map_err(|_| CommandParseError::InvalidArgument {
                    field: "primary|option",
                    arg: target.to_string(),
                })?;
                MarkTriggeredTarget::Option(index)
            };
            Ok(Command::MarkTriggered { token_id, trap_id, which })
        }
        "setpassive" => Ok(Command::SetPassive {
            property: next(&mut parts, "property")?.to_string(),
            trap_id: TrapId::from(next(&mut parts, "trapId")?),
            value: next(&mut parts, "value")?.to_string(),
        }),
        "passivemenu" => Ok(Command::PassiveMenu),
        "resetdetection" => Ok(Command::ResetDetection {
            trap_id: parts.next().map(TrapId::from),
        }),
        "hidedetection" => {
            let minutes = parts
                .next()
                .map(|s| s.parse::<u64>().map_err(|_| CommandParseError::InvalidArgument { field: "minutes", arg: s.to_string() }))
                .transpose()?;
            Ok(Command::HideDetection { minutes })
        }
        "showdetection" => Ok(Command::ShowDetection),
        "rearm" => Ok(Command::Rearm {
            trap_id: TrapId::from(next(&mut parts, "trapId")?),
        }),
        other => Err(CommandParseError::UnknownVerb(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_trapsystem_line_is_rejected() {
        assert_eq!(parse_command("hello there"), Err(CommandParseError::NotATrapsystemCommand));
    }

    #[test]
    fn parses_setup_with_defaults() {
        let cmd = parse_command("!trapsystem setup 1/1 #Explode").expect("parses");
        assert_eq!(
            cmd,
            Command::Setup {
                uses: (1, 1),
                primary: "#Explode".to_string(),
                opt2: None,
                opt3: None,
                position: PositionMode::Intersection,
                auto_trigger: false,
            }
        );
    }

    #[test]
    fn parses_setup_with_all_fields() {
        let cmd = parse_command("!trapsystem setup 2/2 #Explode #Fizzle #Pop center on").expect("parses");
        assert_eq!(
            cmd,
            Command::Setup {
                uses: (2, 2),
                primary: "#Explode".to_string(),
                opt2: Some("#Fizzle".to_string()),
                opt3: Some("#Pop".to_string()),
                position: PositionMode::Center,
                auto_trigger: true,
            }
        );
    }

    #[test]
    fn parses_setupinteraction_with_one_check() {
        let cmd = parse_command("!trapsystem setupinteraction 1/1 #Explode #Safe #Hurt Perception 12 on center off")
            .expect("parses");
        assert_eq!(
            cmd,
            Command::SetupInteraction {
                uses: (1, 1),
                primary: "#Explode".to_string(),
                success: "#Safe".to_string(),
                failure: "#Hurt".to_string(),
                check1: ("Perception".to_string(), 12),
                check2: None,
                movement_trigger: true,
                position: PositionMode::Center,
                auto_trigger: false,
            }
        );
    }

    #[test]
    fn parses_allowmovement_selected_as_none() {
        let cmd = parse_command("!trapsystem allowmovement selected").expect("parses");
        assert_eq!(cmd, Command::AllowMovement { token_id: None });
    }

    #[test]
    fn parses_marktriggered_primary() {
        let cmd = parse_command("!trapsystem marktriggered tok-1 trap-1 primary").expect("parses");
        assert_eq!(
            cmd,
            Command::MarkTriggered {
                token_id: TokenId::from("tok-1"),
                trap_id: TrapId::from("trap-1"),
                which: MarkTriggeredTarget::Primary,
            }
        );
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert_eq!(
            parse_command("!trapsystem notaverb"),
            Err(CommandParseError::UnknownVerb("notaverb".to_string()))
        );
    }

    #[test]
    fn missing_argument_is_reported() {
        assert_eq!(parse_command("!trapsystem toggle").unwrap(), Command::Toggle { trap_id: None });
        assert_eq!(
            parse_command("!trapsystem rearm"),
            Err(CommandParseError::MissingArgument("trapId"))
        );
    }
}
