// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Event Dispatcher (C9): routes host events to the right component and
//! absorbs every recoverable error category into a GM notice (§4.9, §7).

/// `!trapsystem` command parsing.
pub mod command;

use crate::action::{run_action, ActionContext};
use crate::dialogue::{self, PendingCheckStore, RollOutcome, RollPayload};
use crate::effect::HostEffect;
use crate::error::EngineError;
use crate::lock::LockRegistry;
use crate::passive::{self, PassiveSettings};
use crate::trigger::{self, resolve_primary_only};
use command::{Command, CommandParseError, MarkTriggeredTarget};
use std::collections::HashMap;
use trap_domain::{
    AdvantageMode, CharacterId, CheckRef, GlobalToggles, PageId, PassiveLedger, PendingCheck, PlayerId, TokenId,
    TrapId,
};
use trap_host::types::{Door, Graphic, PathObj, Recipient};
use trap_host::HostPort;

const IGNORE_TRAPS_TAG: &str = "{ignoretraps}";
const IGNORE_TRAPS_MARKER: &str = "ignore-traps";
const GM_PLAYER_ID: &str = "gm";

/// The engine's full in-process state: every map owned outside the host
/// object graph (§5's "shared resources" note). One instance per running
/// game; `trap-engine-cli` and any future host adapter each own exactly one.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    /// Active token locks.
    pub locks: LockRegistry,
    /// In-flight skill-check dialogues.
    pub pending_checks: PendingCheckStore,
    /// Passive-spot ledger and message debounce.
    pub ledger: PassiveLedger,
    /// Master toggles (triggers enabled, detection auras hidden).
    pub toggles: GlobalToggles,
}

fn warn(host: &mut dyn HostPort, message: impl Into<String>) -> HostEffect {
    let message = message.into();
    tracing::warn!(%message, "trap dispatcher recovered an error");
    host.whisper(&Recipient::Gm, &message);
    HostEffect::Warned { message }
}

impl EngineState {
    /// Builds an empty state with default toggles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a graphic's mutated fields, in the exact order from §4.9:
    /// lock revert, trigger engine, ignore-traps reconciliation, visual
    /// re-derivation, aura recompute, and locked-token reprojection.
    pub async fn handle_graphic_change(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        before: &Graphic,
        after: Graphic,
        now_ms: u64,
    ) -> Vec<HostEffect> {
        let token_id = after.id.clone();
        let mut effects = Vec::new();
        let position_changed = before.center.distance(&after.center) > f64::EPSILON;

        if position_changed && self.locks.is_locked(&token_id) {
            let mut reverted = after;
            reverted.center = before.center;
            if let Err(err) = host.set_graphic(reverted) {
                effects.push(warn(host, format!("could not revert locked token {token_id}: {err}")));
            }
            return effects;
        }

        let mut current = after;

        if position_changed && !self.is_trap_object(host, &token_id) {
            match trigger::handle_movement(
                host,
                &mut self.locks,
                &mut self.pending_checks,
                &self.toggles,
                page_id,
                &token_id,
                before.center,
                current.center,
                now_ms,
            )
            .await
            {
                Ok(Some(effect)) => effects.push(effect),
                Ok(None) => {}
                Err(err) => effects.push(warn(host, format!("trigger engine error for {token_id}: {err}"))),
            }
            if let Some(page) = host.graphic(&token_id) {
                current = page;
            }
        }

        let was_immune = before.notes.contains(IGNORE_TRAPS_TAG);
        let is_immune = current.notes.contains(IGNORE_TRAPS_TAG);
        if was_immune != is_immune {
            let has_marker = current.status_markers.iter().any(|m| m == IGNORE_TRAPS_MARKER);
            if is_immune && !has_marker {
                current.status_markers.push(IGNORE_TRAPS_MARKER.to_string());
            } else if !is_immune {
                current.status_markers.retain(|m| m != IGNORE_TRAPS_MARKER);
            }
        }

        if before.notes != current.notes {
            if let Ok(config) = trap_notes_codec::decode_notes(&current.notes) {
                let visual = trap_visual::derive_visual_state(&config, &self.toggles, 0.0, now_ms);
                apply_visual_state(&mut current, &visual);

                let size_changed = (before.width - current.width).abs() > f64::EPSILON
                    || (before.height - current.height).abs() > f64::EPSILON;
                let rotation_changed = (before.rotation - current.rotation).abs() > f64::EPSILON;
                if size_changed || rotation_changed || position_changed {
                    let trap_id = TrapId::from(token_id.as_str());
                    for (locked_token, new_point) in self.locks.follow(&trap_id, current.center, current.rotation) {
                        if let Some(mut locked_graphic) = host.graphic(&locked_token) {
                            locked_graphic.center = new_point;
                            let _ = host.set_graphic(locked_graphic);
                        }
                    }
                }
            }
        }

        if let Err(err) = host.set_graphic(current) {
            effects.push(warn(host, format!("could not persist graphic {token_id}: {err}")));
        }

        effects
    }

    fn is_trap_object(&self, host: &dyn HostPort, token_id: &TokenId) -> bool {
        host.graphic(token_id)
            .is_some_and(|g| trap_notes_codec::parser::find_block(&g.notes, "traptrigger").is_some())
    }

    /// Handles a door's open/close transition: a closed→open transition
    /// triggers a page-wide passive scan.
    pub async fn handle_door_change(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        before: &Door,
        after: &Door,
        now_ms: u64,
    ) -> Vec<HostEffect> {
        if !before.is_open && after.is_open {
            self.scan_page(host, page_id, now_ms).await
        } else {
            Vec::new()
        }
    }

    /// Handles a legacy door-path's open transition identically to a door.
    pub async fn handle_path_change(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        before: &PathObj,
        after: &PathObj,
        now_ms: u64,
    ) -> Vec<HostEffect> {
        if before.is_door_path && after.is_door_path && !before.is_open && after.is_open {
            self.scan_page(host, page_id, now_ms).await
        } else {
            Vec::new()
        }
    }

    async fn scan_page(&mut self, host: &mut dyn HostPort, page_id: &PageId, now_ms: u64) -> Vec<HostEffect> {
        let graphics = host.graphics_on_page(page_id);
        let traps: Vec<Graphic> = graphics
            .iter()
            .filter(|g| trap_notes_codec::parser::find_block(&g.notes, "traptrigger").is_some())
            .cloned()
            .collect();
        let observers: Vec<Graphic> = graphics
            .iter()
            .filter(|g| trap_notes_codec::parser::find_block(&g.notes, "traptrigger").is_none())
            .cloned()
            .collect();

        let mut effects = Vec::new();
        for trap in &traps {
            let trap_id = TrapId::from(trap.id.as_str());
            for observer in &observers {
                if let Some(effect) = passive::single_check(
                    host,
                    &mut self.ledger,
                    PassiveSettings::default(),
                    &trap_id,
                    trap,
                    trap.id.as_str(),
                    observer,
                    now_ms,
                )
                .await
                {
                    effects.push(effect);
                }
            }
        }
        effects
    }

    /// Parses and routes one `!trapsystem` chat line. `selected_trap_id` is
    /// the trap implied by the host's current object selection, used by
    /// verbs whose arguments omit it (`toggle`, `status`, `trigger`,
    /// `passivemenu`). `initiator_id` is the chat message's sender.
    pub async fn handle_chat_command(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        line: &str,
        selected_trap_id: Option<&TrapId>,
        initiator_id: &PlayerId,
        now_ms: u64,
    ) -> Vec<HostEffect> {
        let command = match command::parse_command(line) {
            Ok(command) => command,
            Err(CommandParseError::NotATrapsystemCommand) => return Vec::new(),
            Err(err) => return vec![warn(host, format!("malformed trapsystem command: {err}"))],
        };

        match self.route(host, page_id, command, selected_trap_id, initiator_id, now_ms).await {
            Ok(effects) => effects,
            Err(err) => vec![warn(host, err.to_string())],
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn route(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        command: Command,
        selected_trap_id: Option<&TrapId>,
        initiator_id: &PlayerId,
        now_ms: u64,
    ) -> Result<Vec<HostEffect>, EngineError> {
        match command {
            Command::Setup {
                uses,
                primary,
                opt2,
                opt3,
                position,
                auto_trigger,
            } => {
                let trap_id = selected_trap_id.cloned().ok_or_else(|| EngineError::HostObjectMissing("selected".to_string()))?;
                let mut config = trap_domain::TrapConfig {
                    trap_type: trap_domain::TrapType::Standard,
                    current_uses: Some(uses.0),
                    max_uses: Some(uses.1),
                    is_armed: Some(true),
                    primary_macro: Some(primary),
                    position,
                    auto_trigger,
                    ..Default::default()
                };
                config.options = opt2.into_iter().chain(opt3).collect();
                self.write_trap_config(host, &trap_id, &config, now_ms)?;
                Ok(vec![HostEffect::Warned {
                    message: format!("{trap_id} configured as a standard trap"),
                }])
            }
            Command::SetupInteraction {
                uses,
                primary,
                success,
                failure,
                check1,
                check2,
                movement_trigger,
                position,
                auto_trigger,
            } => {
                let trap_id = selected_trap_id.cloned().ok_or_else(|| EngineError::HostObjectMissing("selected".to_string()))?;
                let mut checks = vec![trap_domain::CheckSpec {
                    skill_type: check1.0,
                    dc: check1.1,
                }];
                if let Some((skill_type, dc)) = check2 {
                    checks.push(trap_domain::CheckSpec { skill_type, dc });
                }
                let config = trap_domain::TrapConfig {
                    trap_type: trap_domain::TrapType::Interaction,
                    current_uses: Some(uses.0),
                    max_uses: Some(uses.1),
                    is_armed: Some(true),
                    primary_macro: Some(primary),
                    success_macro: Some(success),
                    failure_macro: Some(failure),
                    checks,
                    movement_trigger,
                    position,
                    auto_trigger,
                    ..Default::default()
                };
                self.write_trap_config(host, &trap_id, &config, now_ms)?;
                Ok(vec![HostEffect::Warned {
                    message: format!("{trap_id} configured as an interaction trap"),
                }])
            }
            Command::Toggle { trap_id } => {
                let trap_id = trap_id.or_else(|| selected_trap_id.cloned()).ok_or_else(selected_missing)?;
                let mut config = self.decode_trap(host, &trap_id)?;
                let now_armed = !config.is_armed.unwrap_or(false);
                if now_armed && config.current_uses.unwrap_or(0) == 0 {
                    config.current_uses = Some(1);
                }
                config.is_armed = Some(now_armed);
                self.write_trap_config(host, &trap_id, &config, now_ms)?;
                Ok(vec![HostEffect::Warned {
                    message: format!("{trap_id} is now {}", if now_armed { "armed" } else { "disarmed" }),
                }])
            }
            Command::Rearm { trap_id } => {
                let mut config = self.decode_trap(host, &trap_id)?;
                config.is_armed = Some(true);
                if config.current_uses.unwrap_or(0) == 0 {
                    config.current_uses = Some(1);
                }
                self.write_trap_config(host, &trap_id, &config, now_ms)?;
                Ok(vec![HostEffect::Warned {
                    message: format!("{trap_id} re-armed"),
                }])
            }
            Command::Status { trap_id } => {
                let trap_id = trap_id.or_else(|| selected_trap_id.cloned()).ok_or_else(selected_missing)?;
                let config = self.decode_trap(host, &trap_id)?;
                host.whisper(
                    &Recipient::Gm,
                    &format!(
                        "{trap_id}: {:?}, uses {}/{}, armed={}",
                        config.trap_type,
                        config.current_uses.unwrap_or(0),
                        config.max_uses.unwrap_or(0),
                        config.is_effectively_armed()
                    ),
                );
                Ok(Vec::new())
            }
            Command::Trigger => {
                let trap_id = selected_trap_id.cloned().ok_or_else(selected_missing)?;
                let trap_token_id = trap_id.as_token_id();
                let trap_graphic = host
                    .graphic(&trap_token_id)
                    .ok_or_else(|| EngineError::HostObjectMissing(trap_id.to_string()))?;
                let config = self.decode_trap(host, &trap_id)?;
                if config.auto_trigger && config.primary_macro.is_some() {
                    let locked_token_id = self.locks.token_for_trap(&trap_id);
                    let ctx = ActionContext {
                        trap_id: &trap_id,
                        trapped_token_id: locked_token_id.as_ref(),
                        target_token_id: None,
                        extra_tags: &HashMap::new(),
                        origin: trap_graphic.center,
                        page_id,
                    };
                    if let Some(primary) = &config.primary_macro {
                        run_action(host, primary, &ctx).await?;
                    }

                    if config.is_interaction() && !config.checks.is_empty() {
                        let character_id =
                            locked_token_id.as_ref().and_then(|id| host.graphic(id)).and_then(|g| g.represents);
                        let character_name = character_id.as_ref().and_then(|id| host.character(id)).map(|c| c.name);
                        self.pending_checks.create(PendingCheck {
                            trap_id: trap_id.clone(),
                            check_ref: CheckRef::Index(0),
                            frozen_check: config.checks[0].clone(),
                            advantage_mode: AdvantageMode::Normal,
                            first_roll: None,
                            initiator_id: initiator_id.clone(),
                            character_id,
                            character_name,
                            locked_token_id: locked_token_id.clone(),
                            mismatched_total: None,
                        });
                        host.whisper(
                            &Recipient::Gm,
                            &format!("GM Response menu for {trap_id}: awaiting a skill-check roll."),
                        );
                        return Ok(vec![HostEffect::GmResponseMenuShown { trap_id }]);
                    }

                    if config.is_primary_only_interaction() || !config.is_interaction() {
                        resolve_primary_only(host, &mut self.locks, &self.toggles, locked_token_id.as_ref(), &trap_id, now_ms)?;
                    }
                    Ok(vec![HostEffect::LockReleased {
                        token_id: locked_token_id.unwrap_or(trap_token_id),
                        committed: true,
                    }])
                } else {
                    host.whisper(&Recipient::Gm, &format!("Control Panel for {trap_id}."));
                    Ok(vec![HostEffect::ControlPanelShown {
                        trap_id,
                        token_id: trap_token_id,
                    }])
                }
            }
            Command::AllowMovement { token_id } => {
                let token_id = token_id.ok_or_else(|| EngineError::HostObjectMissing("selected".to_string()))?;
                self.locks.release(host, &token_id, false, &self.toggles, now_ms)?;
                Ok(vec![HostEffect::LockReleased { token_id, committed: false }])
            }
            Command::AllowAll => {
                let token_ids: Vec<TokenId> = host
                    .graphics_on_page(page_id)
                    .into_iter()
                    .map(|g| g.id)
                    .filter(|id| self.locks.is_locked(id))
                    .collect();
                let mut effects = Vec::new();
                for token_id in token_ids {
                    self.locks.release(host, &token_id, false, &self.toggles, now_ms)?;
                    effects.push(HostEffect::LockReleased { token_id, committed: false });
                }
                Ok(effects)
            }
            Command::IgnoreTraps => {
                let token_id = selected_trap_id
                    .map(trap_domain::TrapId::as_token_id)
                    .ok_or_else(|| EngineError::HostObjectMissing("selected".to_string()))?;
                let mut graphic = host
                    .graphic(&token_id)
                    .ok_or_else(|| EngineError::HostObjectMissing(token_id.to_string()))?;
                let now_immune = !graphic.notes.contains(IGNORE_TRAPS_TAG);
                if now_immune {
                    graphic.notes = format!("{} {IGNORE_TRAPS_TAG}", graphic.notes.trim_end());
                    graphic.status_markers.push(IGNORE_TRAPS_MARKER.to_string());
                } else {
                    graphic.notes = graphic.notes.replace(IGNORE_TRAPS_TAG, "").trim().to_string();
                    graphic.status_markers.retain(|m| m != IGNORE_TRAPS_MARKER);
                }
                host.set_graphic(graphic).map_err(|e| EngineError::HostObjectMissing(e.to_string()))?;
                Ok(vec![HostEffect::Warned {
                    message: format!("{token_id} immunity now {now_immune}"),
                }])
            }
            Command::SetTriggersEnabled(enabled) => {
                self.toggles.triggers_enabled = enabled;
                Ok(vec![HostEffect::Warned {
                    message: format!("triggers {}", if enabled { "enabled" } else { "disabled" }),
                }])
            }
            Command::Interact => {
                let trap_id = selected_trap_id.cloned().ok_or_else(selected_missing)?;
                let token_id = self
                    .locks
                    .token_for_trap(&trap_id)
                    .ok_or_else(|| EngineError::HostObjectMissing(format!("no token locked to {trap_id}")))?;
                host.whisper(&Recipient::Gm, &format!("Interaction menu for {trap_id}."));
                Ok(vec![HostEffect::InteractionMenuShown { trap_id, token_id }])
            }
            Command::Allow | Command::Fail => {
                let succeeded = matches!(command, Command::Allow);
                let pending = self
                    .pending_checks
                    .remove_by_initiator(initiator_id)
                    .ok_or_else(|| EngineError::HostObjectMissing("pending check".to_string()))?;
                self.resolve_pending_check(host, page_id, &pending, succeeded, now_ms).await?;
                Ok(vec![HostEffect::CheckResolved {
                    trap_id: pending.trap_id,
                    success: succeeded,
                }])
            }
            Command::Check => Ok(Vec::new()),
            Command::CustomCheck { skill_type, dc } => {
                if let Some(pending) = self.pending_checks.by_initiator_mut(initiator_id) {
                    pending.frozen_check = trap_domain::CheckSpec { skill_type, dc };
                    pending.check_ref = CheckRef::Custom;
                }
                Ok(Vec::new())
            }
            Command::RollCheck { total, skill_type, character_id } => {
                self.handle_roll(
                    host,
                    page_id,
                    initiator_id,
                    character_id.as_ref(),
                    RollPayload::Single(total),
                    skill_type.as_deref(),
                    now_ms,
                )
                .await
            }
            Command::DisplayDc => {
                if let Some(pending) = self.pending_checks.by_initiator(initiator_id) {
                    host.whisper(&Recipient::Gm, &format!("DC: {}", pending.frozen_check.dc));
                }
                Ok(Vec::new())
            }
            Command::SetDc { dc } => {
                if let Some(pending) = self.pending_checks.by_initiator_mut(initiator_id) {
                    pending.frozen_check.dc = dc;
                }
                Ok(Vec::new())
            }
            Command::SelectCharacter { character_id } => {
                let character_name = host.character(&character_id).map(|c| c.name);
                if let Some(pending) = self.pending_checks.by_initiator_mut(initiator_id) {
                    pending.character_id = Some(character_id);
                    pending.character_name = character_name;
                }
                Ok(Vec::new())
            }
            Command::ResolveMismatch { accept: true } => {
                let pending = self
                    .pending_checks
                    .by_initiator(initiator_id)
                    .ok_or_else(|| EngineError::HostObjectMissing("pending check".to_string()))?;
                let total = pending
                    .mismatched_total
                    .ok_or_else(|| EngineError::HostObjectMissing("mismatched roll".to_string()))?;
                let succeeded = pending.succeeds(total);
                let pending = self.pending_checks.remove_by_initiator(initiator_id).expect("just looked up");
                self.resolve_pending_check(host, page_id, &pending, succeeded, now_ms).await?;
                Ok(vec![HostEffect::CheckResolved {
                    trap_id: pending.trap_id,
                    success: succeeded,
                }])
            }
            Command::ResolveMismatch { accept: false } => {
                if let Some(pending) = self.pending_checks.by_initiator_mut(initiator_id) {
                    pending.check_ref = CheckRef::Custom;
                    pending.mismatched_total = None;
                }
                Ok(Vec::new())
            }
            Command::MarkTriggered { token_id, trap_id, which } => {
                let trap_graphic = host
                    .graphic(&trap_id.as_token_id())
                    .ok_or_else(|| EngineError::HostObjectMissing(trap_id.to_string()))?;
                let config = self.decode_trap(host, &trap_id)?;
                let action = match which {
                    MarkTriggeredTarget::Primary => config.primary_macro.clone(),
                    MarkTriggeredTarget::Option(index) => config.options.get(index).cloned(),
                }
                .ok_or_else(|| EngineError::ActionExecutionFailure(format!("{trap_id} has no such action")))?;

                let ctx = ActionContext {
                    trap_id: &trap_id,
                    trapped_token_id: Some(&token_id),
                    target_token_id: None,
                    extra_tags: &HashMap::new(),
                    origin: trap_graphic.center,
                    page_id,
                };
                run_action(host, &action, &ctx).await?;
                self.locks.mark_macro_triggered(&token_id);
                self.locks.release(host, &token_id, true, &self.toggles, now_ms)?;
                Ok(vec![HostEffect::LockReleased { token_id, committed: true }])
            }
            Command::SetPassive { property, trap_id, value } => {
                let mut config = self.decode_trap(host, &trap_id)?;
                let mut detection = config.detection.unwrap_or_default();
                apply_passive_property(&mut detection, &property, &value)?;
                config.detection = Some(detection);
                self.write_trap_config(host, &trap_id, &config, now_ms)?;
                Ok(Vec::new())
            }
            Command::PassiveMenu => {
                host.whisper(&Recipient::Gm, "Detection setup menu.");
                Ok(Vec::new())
            }
            Command::ResetDetection { trap_id } => {
                match trap_id {
                    Some(trap_id) => self.ledger.reset_trap(&trap_id),
                    None => self.ledger.reset_all(),
                }
                Ok(Vec::new())
            }
            Command::HideDetection { minutes } => {
                self.toggles.detection_auras_hidden = true;
                self.toggles.detection_auras_hidden_until_ms = minutes.map(|m| now_ms + m * 60_000);
                Ok(Vec::new())
            }
            Command::ShowDetection => {
                self.toggles.detection_auras_hidden = false;
                self.toggles.detection_auras_hidden_until_ms = None;
                Ok(Vec::new())
            }
        }
    }

    /// Three-stage pending-check resolver for an incoming roll (§4.6):
    /// 1. a character-tagged roll resolves via `by_character`, authorized as
    ///    the GM, a controller of the character, or the check's own initiator;
    /// 2. failing that (or with no character id at all), a roller who
    ///    controls exactly one character with an active check is associated
    ///    to it;
    /// 3. otherwise falls back to `by_initiator`.
    ///
    /// A failed stage-1 authorization is recovered locally (§7 item 3): it is
    /// logged and the search continues rather than erroring out.
    fn resolve_pending_for_roll(
        &self,
        host: &dyn HostPort,
        initiator_id: &PlayerId,
        character_id: Option<&CharacterId>,
    ) -> Option<(PlayerId, PendingCheck)> {
        if let Some(character_id) = character_id {
            if let Some(pending) = self.pending_checks.by_character(character_id) {
                let is_gm = initiator_id.as_str() == GM_PLAYER_ID;
                let is_initiator = pending.initiator_id == *initiator_id;
                let controls = host.character(character_id).is_some_and(|c| c.controlled_by.contains(initiator_id));
                if is_gm || is_initiator || controls {
                    return Some((pending.initiator_id.clone(), pending.clone()));
                }
                let denied = EngineError::AuthorizationDenied { who: initiator_id.to_string() };
                tracing::warn!(%denied, "stage 1 authorization failed, continuing search");
            }
        }

        let controlled_with_active_check: Vec<CharacterId> = self
            .pending_checks
            .active_character_ids()
            .cloned()
            .filter(|cid| host.character(cid).is_some_and(|c| c.controlled_by.contains(initiator_id)))
            .collect();
        if let [only] = controlled_with_active_check.as_slice() {
            if let Some(pending) = self.pending_checks.by_character(only) {
                return Some((pending.initiator_id.clone(), pending.clone()));
            }
        }

        let pending = self.pending_checks.by_initiator(initiator_id)?;
        Some((pending.initiator_id.clone(), pending.clone()))
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_roll(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        initiator_id: &PlayerId,
        character_id: Option<&CharacterId>,
        payload: RollPayload,
        skill_type: Option<&str>,
        now_ms: u64,
    ) -> Result<Vec<HostEffect>, EngineError> {
        let Some((owner_id, pending)) = self.resolve_pending_for_roll(host, initiator_id, character_id) else {
            return Ok(Vec::new());
        };

        if !dialogue::skills_compatible(&pending.frozen_check.skill_type, skill_type) {
            let mismatch = EngineError::Mismatch {
                expected: dialogue::normalize_skill(&pending.frozen_check.skill_type),
                rolled: skill_type.map(dialogue::normalize_skill).unwrap_or_default(),
            };
            host.whisper(&Recipient::Gm, &mismatch.to_string());
            if let RollOutcome::Complete(total) = dialogue::resolve_roll_total(pending.advantage_mode, payload, pending.first_roll) {
                if let Some(stored) = self.pending_checks.by_initiator_mut(&owner_id) {
                    stored.mismatched_total = Some(total);
                }
            }
            let character_id = pending.character_id.clone().unwrap_or_else(|| CharacterId::from(""));
            return Ok(vec![HostEffect::MismatchArbitrationShown { character_id }]);
        }

        match dialogue::resolve_roll_total(pending.advantage_mode, payload, pending.first_roll) {
            RollOutcome::AwaitingSecond => {
                if let RollPayload::Single(value) = payload {
                    self.pending_checks.set_first_roll(&owner_id, value);
                }
                Ok(vec![HostEffect::AwaitingSecondRoll {
                    character_id: pending.character_id.clone().unwrap_or_else(|| CharacterId::from("")),
                }])
            }
            RollOutcome::Complete(total) => {
                let succeeded = pending.succeeds(total);
                self.pending_checks.remove_by_initiator(&owner_id);
                self.resolve_pending_check(host, page_id, &pending, succeeded, now_ms).await?;
                Ok(vec![HostEffect::CheckResolved {
                    trap_id: pending.trap_id,
                    success: succeeded,
                }])
            }
        }
    }

    async fn resolve_pending_check(
        &mut self,
        host: &mut dyn HostPort,
        page_id: &PageId,
        pending: &PendingCheck,
        succeeded: bool,
        now_ms: u64,
    ) -> Result<(), EngineError> {
        let config = self.decode_trap(host, &pending.trap_id)?;
        let action = if succeeded { &config.success_macro } else { &config.failure_macro };
        if let Some(action) = action {
            let trap_graphic = host
                .graphic(&pending.trap_id.as_token_id())
                .ok_or_else(|| EngineError::HostObjectMissing(pending.trap_id.to_string()))?;
            let ctx = ActionContext {
                trap_id: &pending.trap_id,
                trapped_token_id: pending.locked_token_id.as_ref(),
                target_token_id: None,
                extra_tags: &HashMap::new(),
                origin: trap_graphic.center,
                page_id,
            };
            run_action(host, action, &ctx).await?;
        }
        resolve_primary_only(host, &mut self.locks, &self.toggles, pending.locked_token_id.as_ref(), &pending.trap_id, now_ms)
    }

    fn decode_trap(&self, host: &dyn HostPort, trap_id: &TrapId) -> Result<trap_domain::TrapConfig, EngineError> {
        let graphic = host
            .graphic(&trap_id.as_token_id())
            .ok_or_else(|| EngineError::HostObjectMissing(trap_id.to_string()))?;
        trap_notes_codec::decode_notes(&graphic.notes).map_err(|e| EngineError::ConfigParse(e.to_string()))
    }

    fn write_trap_config(
        &self,
        host: &mut dyn HostPort,
        trap_id: &TrapId,
        config: &trap_domain::TrapConfig,
        now_ms: u64,
    ) -> Result<(), EngineError> {
        let mut graphic = host
            .graphic(&trap_id.as_token_id())
            .ok_or_else(|| EngineError::HostObjectMissing(trap_id.to_string()))?;
        graphic.notes = trap_notes_codec::encode_notes(&graphic.notes, config);
        let visual = trap_visual::derive_visual_state(config, &self.toggles, 0.0, now_ms);
        apply_visual_state(&mut graphic, &visual);
        host.set_graphic(graphic).map_err(|e| EngineError::HostObjectMissing(e.to_string()))
    }
}

fn selected_missing() -> EngineError {
    EngineError::HostObjectMissing("selected".to_string())
}

fn apply_visual_state(graphic: &mut Graphic, visual: &trap_visual::VisualState) {
    use trap_visual::{DetectionAuraColor, TriggerAuraColor};

    graphic.aura1_color = Some(
        match visual.trigger_aura {
            TriggerAuraColor::ArmedInteraction | TriggerAuraColor::Armed => "green",
            TriggerAuraColor::Paused => "yellow",
            TriggerAuraColor::DisarmedInteraction | TriggerAuraColor::Disarmed => "gray",
        }
        .to_string(),
    );
    graphic.aura2_color = Some(
        match visual.detection_aura_color {
            DetectionAuraColor::Detection => "blue",
            DetectionAuraColor::Detected => "purple",
            DetectionAuraColor::DisarmedUndetected | DetectionAuraColor::DisarmedDetected => "gray",
            DetectionAuraColor::PassiveDisabled | DetectionAuraColor::DetectionOff => "transparent",
        }
        .to_string(),
    );
    graphic.aura2_radius = visual.detection_aura_radius;
    graphic.bar1_value = Some(f64::from(visual.uses_bar.current));
    graphic.bar1_max = Some(f64::from(visual.uses_bar.max));
    graphic.bar2_value = visual.spot_dc_bar.map(f64::from);
}

fn apply_passive_property(
    detection: &mut trap_domain::DetectionConfig,
    property: &str,
    value: &str,
) -> Result<(), EngineError> {
    match property {
        "dc" => {
            detection.passive_spot_dc =
                Some(value.parse().map_err(|_| EngineError::ConfigParse(format!("invalid dc: {value}")))?);
        }
        "range" => {
            detection.passive_max_range =
                Some(value.parse().map_err(|_| EngineError::ConfigParse(format!("invalid range: {value}")))?);
        }
        "enabled" => detection.passive_enabled = value == "true" || value == "on",
        "aura" => detection.show_detection_aura = value == "true" || value == "on",
        "luck" => detection.enable_luck_roll = value == "true" || value == "on",
        other => return Err(EngineError::ConfigParse(format!("unknown passive property: {other}"))),
    }
    Ok(())
}
