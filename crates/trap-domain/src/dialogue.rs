// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pending Check: an in-flight skill-check dialogue (§3, §4.6).

use crate::ids::{CharacterId, PlayerId, TokenId, TrapId};
use crate::trap_config::CheckSpec;

/// Advantage/disadvantage mode for a pending check's roll.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AdvantageMode {
    /// No advantage or disadvantage.
    #[default]
    Normal,
    /// Roll twice, keep the higher (or the explicitly tagged "preferred" die).
    Advantage,
    /// Roll twice, keep the lower (or the explicitly tagged "preferred" die).
    Disadvantage,
}

/// Which of a trap's configured checks a pending check refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CheckRef {
    /// One of `TrapConfig::checks`, by index.
    Index(usize),
    /// An arbitrary `{skillType, dc}` unrelated to the trap's configured checks.
    Custom,
}

/// A single in-flight skill-check dialogue, indexed by both initiator and
/// (optionally) character id.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCheck {
    /// The trap this check belongs to.
    pub trap_id: TrapId,
    /// Which configured check (or a custom one) this dialogue resolves.
    pub check_ref: CheckRef,
    /// The frozen `{skillType, dc}` at the time the dialogue was created.
    pub frozen_check: CheckSpec,
    /// Advantage/disadvantage mode selected by the GM.
    pub advantage_mode: AdvantageMode,
    /// First roll of a two-step advantage/disadvantage sequence, if any.
    pub first_roll: Option<i32>,
    /// The player/GM who opened this dialogue.
    pub initiator_id: PlayerId,
    /// The character associated with this check, once known.
    pub character_id: Option<CharacterId>,
    /// Display name of the associated character, for messages.
    pub character_name: Option<String>,
    /// The token locked by the triggering trap, if any.
    pub locked_token_id: Option<TokenId>,
    /// The total from a roll that mismatched this check's skill, kept so a
    /// GM "Accept this roll" can still process it against `frozen_check.dc`.
    pub mismatched_total: Option<i32>,
}

impl PendingCheck {
    /// Whether the incoming roll total clears this check's frozen DC.
    #[must_use]
    pub const fn succeeds(&self, final_total: i32) -> bool {
        final_total >= self.frozen_check.dc
    }
}
