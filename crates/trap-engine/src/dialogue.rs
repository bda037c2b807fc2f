// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dialogue State (C6): pending skill-check dialogues and roll resolution (§4.6).

use std::collections::HashMap;
use trap_domain::{AdvantageMode, CharacterId, PendingCheck, PlayerId};

/// Pending checks, indexed both by initiator id and (when known) by
/// character id, as one logical record (§3's "indexed two ways").
#[derive(Debug, Clone, Default)]
pub struct PendingCheckStore {
    by_initiator: HashMap<PlayerId, PendingCheck>,
    character_index: HashMap<CharacterId, PlayerId>,
}

impl PendingCheckStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pending check, replacing any prior check from the same
    /// initiator (per-character uniqueness is the caller's responsibility —
    /// see §8's "at most one active pending check per character" invariant).
    pub fn create(&mut self, check: PendingCheck) {
        if let Some(character_id) = &check.character_id {
            self.character_index.insert(character_id.clone(), check.initiator_id.clone());
        }
        self.by_initiator.insert(check.initiator_id.clone(), check);
    }

    /// Looks up by initiator id (stage 3 of the resolver).
    #[must_use]
    pub fn by_initiator(&self, initiator_id: &PlayerId) -> Option<&PendingCheck> {
        self.by_initiator.get(initiator_id)
    }

    /// Looks up by character id (stage 1 of the resolver).
    #[must_use]
    pub fn by_character(&self, character_id: &CharacterId) -> Option<&PendingCheck> {
        let initiator_id = self.character_index.get(character_id)?;
        self.by_initiator.get(initiator_id)
    }

    /// Whether `character_id` already has an active pending check (§8 invariant guard).
    #[must_use]
    pub fn has_active_for_character(&self, character_id: &CharacterId) -> bool {
        self.character_index.contains_key(character_id)
    }

    /// Every character id that currently has an active pending check (stage 2
    /// of the resolver: "a roller controlling exactly one such character").
    pub fn active_character_ids(&self) -> impl Iterator<Item = &CharacterId> + '_ {
        self.character_index.keys()
    }

    /// Removes and returns the pending check belonging to `initiator_id`,
    /// clearing the character index entry too.
    pub fn remove_by_initiator(&mut self, initiator_id: &PlayerId) -> Option<PendingCheck> {
        let check = self.by_initiator.remove(initiator_id)?;
        if let Some(character_id) = &check.character_id {
            self.character_index.remove(character_id);
        }
        Some(check)
    }

    /// Stores an updated `first_roll` on an in-flight two-step advantage/disadvantage check.
    pub fn set_first_roll(&mut self, initiator_id: &PlayerId, value: i32) {
        if let Some(check) = self.by_initiator.get_mut(initiator_id) {
            check.first_roll = Some(value);
        }
    }

    /// Mutably borrows the pending check for `initiator_id`, if any — used by
    /// the dispatcher's `setdc`/`selectcharacter`/`resolvemismatch` verbs,
    /// which amend an in-flight dialogue in place.
    pub fn by_initiator_mut(&mut self, initiator_id: &PlayerId) -> Option<&mut PendingCheck> {
        self.by_initiator.get_mut(initiator_id)
    }
}

/// Normalizes a skill name for compatibility comparison: lowercased, with a
/// trailing `" check"` or `" save"` suffix stripped.
#[must_use]
pub fn normalize_skill(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower
        .strip_suffix(" check")
        .or_else(|| lower.strip_suffix(" save"))
        .unwrap_or(&lower)
        .to_string()
}

/// Whether an incoming roll's (possibly absent) skill name is compatible with
/// a pending check's expected skill.
///
/// Flat↔flat (both unnamed) is accepted; a named expectation requires an
/// exact (normalized) name match; flat↔named and named↔named mismatches are
/// rejected.
#[must_use]
pub fn skills_compatible(expected_skill: &str, rolled_skill: Option<&str>) -> bool {
    let expected_norm = normalize_skill(expected_skill);
    match rolled_skill {
        None => expected_norm.is_empty(),
        Some(rolled) => !expected_norm.is_empty() && expected_norm == normalize_skill(rolled),
    }
}

/// The dice actually rolled in one chat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollPayload {
    /// A single die total (e.g. a straightforward roll, or one half of a manual adv/dis sequence).
    Single(i32),
    /// A two-die pair, as produced by the host's built-in advantage/disadvantage roll template.
    Pair {
        /// First die's total.
        first: i32,
        /// Second die's total.
        second: i32,
    },
}

/// Result of folding one incoming roll into a pending check's advantage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollOutcome {
    /// The check is fully resolved; carries the final total to compare against the DC.
    Complete(i32),
    /// A manual two-step advantage/disadvantage roll is waiting on its second die.
    AwaitingSecond,
}

/// Combines one incoming roll with a pending check's advantage mode and any
/// already-stored first roll (§4.6 "Advantage semantics").
#[must_use]
pub fn resolve_roll_total(mode: AdvantageMode, payload: RollPayload, stored_first_roll: Option<i32>) -> RollOutcome {
    match payload {
        RollPayload::Pair { first, second } => RollOutcome::Complete(match mode {
            AdvantageMode::Advantage => first.max(second),
            AdvantageMode::Disadvantage => first.min(second),
            AdvantageMode::Normal => first,
        }),
        RollPayload::Single(value) => match mode {
            AdvantageMode::Normal => RollOutcome::Complete(value),
            AdvantageMode::Advantage | AdvantageMode::Disadvantage => match stored_first_roll {
                None => RollOutcome::AwaitingSecond,
                Some(first) => RollOutcome::Complete(match mode {
                    AdvantageMode::Advantage => first.max(value),
                    AdvantageMode::Disadvantage => first.min(value),
                    AdvantageMode::Normal => value,
                }),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trap_domain::{CheckRef, TrapConfig, TrapId};

    fn sample_check(initiator: &str, character: Option<&str>) -> PendingCheck {
        PendingCheck {
            trap_id: TrapId::from("trap-1"),
            check_ref: CheckRef::Index(0),
            frozen_check: TrapConfig::default().checks.first().cloned().unwrap_or(trap_domain::CheckSpec {
                skill_type: "Perception".to_string(),
                dc: 12,
            }),
            advantage_mode: AdvantageMode::Normal,
            first_roll: None,
            initiator_id: PlayerId::from(initiator),
            character_id: character.map(CharacterId::from),
            character_name: None,
            locked_token_id: None,
            mismatched_total: None,
        }
    }

    #[test]
    fn stores_and_finds_by_both_indices() {
        let mut store = PendingCheckStore::new();
        store.create(sample_check("gm", Some("char-1")));

        assert!(store.by_initiator(&PlayerId::from("gm")).is_some());
        assert!(store.by_character(&CharacterId::from("char-1")).is_some());
    }

    #[test]
    fn removal_clears_both_indices() {
        let mut store = PendingCheckStore::new();
        store.create(sample_check("gm", Some("char-1")));
        store.remove_by_initiator(&PlayerId::from("gm"));

        assert!(store.by_initiator(&PlayerId::from("gm")).is_none());
        assert!(store.by_character(&CharacterId::from("char-1")).is_none());
        assert!(!store.has_active_for_character(&CharacterId::from("char-1")));
    }

    #[test]
    fn normalizes_check_and_save_suffixes() {
        assert_eq!(normalize_skill("Perception Check"), "perception");
        assert_eq!(normalize_skill("Wisdom Save"), "wisdom");
        assert_eq!(normalize_skill("Perception"), "perception");
    }

    #[test]
    fn flat_flat_is_compatible() {
        assert!(skills_compatible("", None));
    }

    #[test]
    fn named_same_skill_is_compatible() {
        assert!(skills_compatible("Perception", Some("Perception Check")));
    }

    #[test]
    fn flat_named_mismatch_is_rejected() {
        assert!(!skills_compatible("", Some("Perception")));
        assert!(!skills_compatible("Perception", None));
    }

    #[test]
    fn named_named_mismatch_is_rejected() {
        assert!(!skills_compatible("Perception", Some("Investigation")));
    }

    #[test]
    fn pair_roll_picks_max_under_advantage() {
        let outcome = resolve_roll_total(AdvantageMode::Advantage, RollPayload::Pair { first: 8, second: 17 }, None);
        assert_eq!(outcome, RollOutcome::Complete(17));
    }

    #[test]
    fn single_roll_under_advantage_awaits_second_then_combines() {
        let first = resolve_roll_total(AdvantageMode::Advantage, RollPayload::Single(8), None);
        assert_eq!(first, RollOutcome::AwaitingSecond);

        let second = resolve_roll_total(AdvantageMode::Advantage, RollPayload::Single(17), Some(8));
        assert_eq!(second, RollOutcome::Complete(17));
    }

    #[test]
    fn normal_mode_single_roll_completes_immediately() {
        let outcome = resolve_roll_total(AdvantageMode::Normal, RollPayload::Single(14), None);
        assert_eq!(outcome, RollOutcome::Complete(14));
    }
}
