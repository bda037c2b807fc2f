// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passive Notice Ledger: one-shot spot tracking and message debounce (§3, §9).

use crate::ids::{CharacterId, TokenId, TrapId};
use std::collections::{HashMap, HashSet};

/// Identifies an observer for the `spotted` ledger.
///
/// Per the open question in §9: the ledger is keyed by character id when the
/// observer has one, else by token id; the debounce queue (below) is always
/// keyed by character id, so token-only observers are never debounced. This
/// is preserved as documented, not "fixed".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObserverKey {
    /// Observer has an associated character.
    Character(CharacterId),
    /// Observer is a bare token with no character.
    Token(TokenId),
}

/// A single rendered player message kept for debounce comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveMessage {
    /// The exact rendered message body.
    pub content: String,
    /// Wall-clock send time, in milliseconds.
    pub timestamp_ms: u64,
}

/// Tracks which (trap, observer) pairs have already fired a passive-spot
/// notice, and recent player messages per character for debounce.
#[derive(Debug, Clone, Default)]
pub struct PassiveLedger {
    spotted: HashMap<TrapId, HashSet<ObserverKey>>,
    recent_player_messages: HashMap<CharacterId, Vec<PassiveMessage>>,
}

impl PassiveLedger {
    /// Whether `observer` has already spotted `trap`.
    #[must_use]
    pub fn has_spotted(&self, trap_id: &TrapId, observer: &ObserverKey) -> bool {
        self.spotted
            .get(trap_id)
            .is_some_and(|observers| observers.contains(observer))
    }

    /// Records that `observer` has spotted `trap`.
    pub fn mark_spotted(&mut self, trap_id: TrapId, observer: ObserverKey) {
        self.spotted.entry(trap_id).or_default().insert(observer);
    }

    /// Clears all spotted-state for a single trap (`resetdetection <trap>`).
    pub fn reset_trap(&mut self, trap_id: &TrapId) {
        self.spotted.remove(trap_id);
    }

    /// Clears all spotted-state for every trap (`resetdetection` with no args).
    pub fn reset_all(&mut self) {
        self.spotted.clear();
    }

    /// Returns `true` if an identical message is already in-window for
    /// `character_id`, given the current `now_ms` and `window_ms`. Expired
    /// entries are pruned as a side effect.
    pub fn is_debounced(
        &mut self,
        character_id: &CharacterId,
        content: &str,
        now_ms: u64,
        window_ms: u64,
    ) -> bool {
        let Some(entries) = self.recent_player_messages.get_mut(character_id) else {
            return false;
        };
        entries.retain(|m| now_ms.saturating_sub(m.timestamp_ms) < window_ms);
        entries.iter().any(|m| m.content == content)
    }

    /// Records that `content` was sent to `character_id`'s controllers at `now_ms`.
    pub fn record_sent(&mut self, character_id: CharacterId, content: String, now_ms: u64) {
        self.recent_player_messages
            .entry(character_id)
            .or_default()
            .push(PassiveMessage {
                content,
                timestamp_ms: now_ms,
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spotted_is_per_trap_then_observer() {
        let mut ledger = PassiveLedger::default();
        let trap_a = TrapId::from("trap-a");
        let trap_b = TrapId::from("trap-b");
        let observer = ObserverKey::Character(CharacterId::from("char-1"));

        ledger.mark_spotted(trap_a.clone(), observer.clone());
        assert!(ledger.has_spotted(&trap_a, &observer));
        assert!(!ledger.has_spotted(&trap_b, &observer));
    }

    #[test]
    fn debounce_suppresses_identical_message_within_window() {
        let mut ledger = PassiveLedger::default();
        let char_id = CharacterId::from("char-1");
        ledger.record_sent(char_id.clone(), "spotted trap".into(), 1_000);

        assert!(ledger.is_debounced(&char_id, "spotted trap", 1_500, 100_000));
        assert!(!ledger.is_debounced(&char_id, "different message", 1_500, 100_000));
    }

    #[test]
    fn debounce_expires_outside_window() {
        let mut ledger = PassiveLedger::default();
        let char_id = CharacterId::from("char-1");
        ledger.record_sent(char_id.clone(), "spotted trap".into(), 1_000);

        assert!(!ledger.is_debounced(&char_id, "spotted trap", 200_000, 100_000));
    }
}
