// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lock Registry (C4): immobility state for tokens engaged with traps (§4.4).

use crate::error::EngineError;
use std::collections::HashMap;
use trap_domain::{LockRecord, TokenId, TrapConfig, TrapId};
use trap_geom::Vec2;
use trap_host::types::Graphic;
use trap_host::HostPort;
use trap_notes_codec::parser::{find_block, parse_pairs};

const LOCKED_TAG: &str = "traplocked";

/// In-process table of active locks, keyed by the locked token's id.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    records: HashMap<TokenId, LockRecord>,
    /// Tokens granted one free move (the step right after a commit-release),
    /// so that movement is not immediately re-trapped.
    free_move: std::collections::HashSet<TokenId>,
}

impl LockRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `token_id` currently holds a lock.
    #[must_use]
    pub fn is_locked(&self, token_id: &TokenId) -> bool {
        self.records.contains_key(token_id)
    }

    /// Borrows the lock record for `token_id`, if any.
    #[must_use]
    pub fn get(&self, token_id: &TokenId) -> Option<&LockRecord> {
        self.records.get(token_id)
    }

    /// Marks `token_id` as free to move once without re-triggering.
    pub fn grant_free_move(&mut self, token_id: TokenId) {
        self.free_move.insert(token_id);
    }

    /// Consumes (and clears) a pending free-move grant for `token_id`.
    pub fn take_free_move(&mut self, token_id: &TokenId) -> bool {
        self.free_move.remove(token_id)
    }

    /// Sets `macro_triggered` on an existing lock record.
    pub fn mark_macro_triggered(&mut self, token_id: &TokenId) {
        if let Some(record) = self.records.get_mut(token_id) {
            record.macro_triggered = true;
        }
    }

    /// Creates a lock record and writes the `{!traplocked trap:<id>}` marker
    /// to the token's notes. The caller must already have moved the token to
    /// `snapped_point` on the host (§4.4's concurrency policy: set position
    /// before inserting the lock, so the next move event's revert is a no-op).
    pub fn acquire(
        &mut self,
        host: &mut dyn HostPort,
        token_id: TokenId,
        trap_id: TrapId,
        snapped_point: Vec2,
        trap_center: Vec2,
        trap_rotation_deg: f64,
        trap_snapshot: TrapConfig,
    ) -> Result<(), EngineError> {
        let relative_offset = snapped_point.sub(&trap_center).rotate_deg(-trap_rotation_deg);
        let record = LockRecord::new(trap_id.clone(), relative_offset, trap_snapshot);
        self.records.insert(token_id.clone(), record);

        let mut graphic = host
            .graphic(&token_id)
            .ok_or_else(|| EngineError::HostObjectMissing(token_id.to_string()))?;
        graphic.notes = append_locked_marker(&graphic.notes, &trap_id);
        host.set_graphic(graphic)
            .map_err(|e| EngineError::HostObjectMissing(e.to_string()))?;
        Ok(())
    }

    /// Releases a lock. If `commit` is set and the lock's `macro_triggered`
    /// flag is set, re-parses the trap's current notes, decrements
    /// `currentUses` by one (idempotent: a duplicate release after the record
    /// is already gone is a no-op), re-emits the notes, and re-derives visuals.
    ///
    /// Returns the removed record, if one existed.
    pub fn release(
        &mut self,
        host: &mut dyn HostPort,
        token_id: &TokenId,
        commit: bool,
        toggles: &trap_domain::GlobalToggles,
        now_ms: u64,
    ) -> Result<Option<LockRecord>, EngineError> {
        let Some(record) = self.records.remove(token_id) else {
            return Ok(None);
        };

        if commit && record.macro_triggered {
            deplete_one_use(host, &record.trap_id, toggles, now_ms)?;
        }

        self.free_move.insert(token_id.clone());
        Ok(Some(record))
    }

    /// Finds the token currently locked to `trap_id`, if any. Chat-command
    /// verbs that name a trap but no explicit token (`interact`) resolve
    /// their target this way.
    #[must_use]
    pub fn token_for_trap(&self, trap_id: &TrapId) -> Option<TokenId> {
        self.records.iter().find(|(_, record)| &record.trap_id == trap_id).map(|(token_id, _)| token_id.clone())
    }

    /// Reprojects every lock record pointing at `trap_id` through its new
    /// `(center, rotation)`, returning the recomputed world position for
    /// each affected token. The caller is responsible for writing those
    /// positions back via the host.
    #[must_use]
    pub fn follow(&self, trap_id: &TrapId, new_center: Vec2, new_rotation_deg: f64) -> Vec<(TokenId, Vec2)> {
        self.records
            .iter()
            .filter(|(_, record)| &record.trap_id == trap_id)
            .map(|(token_id, record)| {
                let world = record.relative_offset.rotate_deg(new_rotation_deg).add(&new_center);
                (token_id.clone(), world)
            })
            .collect()
    }

    /// Scans every graphic on `page_id` for a `{!traplocked}` marker and
    /// rebuilds the in-memory registry from it (§9: survives soft restarts).
    /// `macro_triggered` cannot be recovered from host state and defaults to
    /// `false`; a lock rehydrated this way will not deplete a use on release
    /// unless a new action re-triggers it.
    pub fn rehydrate(&mut self, host: &dyn HostPort, page_id: &trap_domain::PageId) {
        for token in host.graphics_on_page(page_id) {
            let Some(trap_id) = parse_locked_marker(&token.notes) else {
                continue;
            };
            let Some(trap_graphic) = find_trap_graphic(host, page_id, &trap_id) else {
                continue;
            };
            let trap_config = trap_notes_codec::decode_notes(&trap_graphic.notes).unwrap_or_default();
            let relative_offset = token
                .center
                .sub(&trap_graphic.center)
                .rotate_deg(-trap_graphic.rotation);
            self.records.insert(
                token.id,
                LockRecord::new(trap_id, relative_offset, trap_config),
            );
        }
    }
}

fn find_trap_graphic(host: &dyn HostPort, page_id: &trap_domain::PageId, trap_id: &TrapId) -> Option<Graphic> {
    host.graphics_on_page(page_id)
        .into_iter()
        .find(|g| g.id.as_str() == trap_id.as_str())
}

fn append_locked_marker(notes: &str, trap_id: &TrapId) -> String {
    let marker = format!("{{!{LOCKED_TAG} trap:[{trap_id}]}}");
    if notes.trim().is_empty() {
        marker
    } else {
        format!("{} {}", notes.trim_end(), marker)
    }
}

fn parse_locked_marker(notes: &str) -> Option<TrapId> {
    let block = find_block(notes, LOCKED_TAG)?;
    let pairs = parse_pairs(&block.inner).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == "trap")
        .map(|(_, value)| TrapId::from(value))
}

/// Decrements a trap's `currentUses` by one directly, with no associated
/// lock record — the "no locked token" half of §4.5's primary-only
/// resolution and §4.6's post-check resolution.
pub fn deplete_trap_use(
    host: &mut dyn HostPort,
    trap_id: &TrapId,
    toggles: &trap_domain::GlobalToggles,
    now_ms: u64,
) -> Result<(), EngineError> {
    deplete_one_use(host, trap_id, toggles, now_ms)
}

fn deplete_one_use(
    host: &mut dyn HostPort,
    trap_id: &TrapId,
    toggles: &trap_domain::GlobalToggles,
    now_ms: u64,
) -> Result<(), EngineError> {
    let trap_token_id = trap_id.as_token_id();
    let mut trap_graphic = host
        .graphic(&trap_token_id)
        .ok_or_else(|| EngineError::HostObjectMissing(trap_id.to_string()))?;

    let mut config = trap_notes_codec::decode_notes(&trap_graphic.notes)
        .map_err(|e| EngineError::ConfigParse(e.to_string()))?;
    config.current_uses = Some(config.current_uses.unwrap_or(0).saturating_sub(1));

    trap_graphic.notes = trap_notes_codec::encode_notes(&trap_graphic.notes, &config);

    let visual = trap_visual::derive_visual_state(&config, toggles, 0.0, now_ms);
    trap_graphic.bar1_value = Some(f64::from(visual.uses_bar.current));
    trap_graphic.bar1_max = Some(f64::from(visual.uses_bar.max));

    host.set_graphic(trap_graphic)
        .map_err(|e| EngineError::HostObjectMissing(e.to_string()))
}
