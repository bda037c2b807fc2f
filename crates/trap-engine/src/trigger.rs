// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trigger Engine (C5): movement-driven trap detection and resolution (§4.5).

use crate::action::{run_action, ActionContext};
use crate::dialogue::PendingCheckStore;
use crate::effect::HostEffect;
use crate::error::EngineError;
use crate::lock::LockRegistry;
use std::collections::HashMap;
use trap_domain::{
    AdvantageMode, CheckRef, GlobalToggles, PageId, PendingCheck, PlayerId, PositionMode, TokenId, TrapId, TrapType,
};
use trap_geom::{Obb, Vec2};
use trap_host::types::{Layer, Recipient};
use trap_host::HostPort;

/// Fraction of `gridSize` below which a move is ignored as jitter (§4.1 default).
const MIN_MOVEMENT_FRACTION: f64 = 0.3;
/// Minimum fraction of the mover's AABB area that must overlap a trap's AABB
/// for the grid-overlap fallback to count as a hit.
const GRID_OVERLAP_MIN_FRACTION: f64 = 0.05;
/// Delay before the occupancy-adjusted second move of a two-step snap is applied.
const OCCUPANCY_MOVE_DELAY_MS: u64 = 50;
const IGNORE_TRAPS_MARKER: &str = "ignore-traps";
const IGNORE_TRAPS_TAG: &str = "{ignoretraps}";
/// Synthetic initiator id used for dialogues opened by the engine itself
/// rather than by a specific player (the GM Response menu is always
/// addressed to, and answerable by, the GM).
const GM_PLAYER_ID: &str = "gm";

fn is_immune(graphic: &trap_host::types::Graphic) -> bool {
    graphic.notes.contains(IGNORE_TRAPS_TAG) && graphic.status_markers.iter().any(|m| m == IGNORE_TRAPS_MARKER)
}

fn aabb(obb: &Obb) -> (Vec2, Vec2) {
    let corners = obb.corners();
    let min_x = corners.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max);
    (Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
}

/// Fraction of `mover`'s AABB area that overlaps `trap`'s AABB.
fn grid_overlap_fraction(mover: &Obb, trap: &Obb) -> f64 {
    let (mover_min, mover_max) = aabb(mover);
    let (trap_min, trap_max) = aabb(trap);
    let overlap_w = (mover_max.x.min(trap_max.x) - mover_min.x.max(trap_min.x)).max(0.0);
    let overlap_h = (mover_max.y.min(trap_max.y) - mover_min.y.max(trap_min.y)).max(0.0);
    let overlap_area = overlap_w * overlap_h;
    let mover_area = (mover_max.x - mover_min.x) * (mover_max.y - mover_min.y);
    if mover_area <= f64::EPSILON {
        0.0
    } else {
        overlap_area / mover_area
    }
}

/// Computes the immediate snap point and, for `center`/`fixed` position
/// modes, an optional occupancy-adjusted final point for a follow-up
/// scheduled move (§4.1, §4.5 step 4).
fn compute_snap(
    trap_obb: &Obb,
    position: PositionMode,
    raw_point: Vec2,
    grid_size: f64,
    other_graphics: &[trap_host::types::Graphic],
    token_id: &TokenId,
) -> (Vec2, Option<Vec2>) {
    let occupancy_tolerance = grid_size / 2.0;
    let is_occupied = |point: Vec2| {
        other_graphics
            .iter()
            .any(|g| g.id != *token_id && g.layer == Layer::Object && g.center.distance(&point) < occupancy_tolerance)
    };

    match position {
        PositionMode::Intersection => (trap_geom::snap::snap_intersection(trap_obb, raw_point, grid_size), None),
        PositionMode::Center => {
            let ideal = trap_geom::snap::snap_center(trap_obb, grid_size, |_| false);
            let adjusted = trap_geom::snap::snap_center(trap_obb, grid_size, is_occupied);
            if ideal.distance(&adjusted) > f64::EPSILON {
                (ideal, Some(adjusted))
            } else {
                (ideal, None)
            }
        }
        PositionMode::Fixed { cell_x, cell_y } => {
            let ideal = trap_geom::snap::snap_fixed_cell(trap_obb, grid_size, cell_x, cell_y, |_| false);
            let adjusted = trap_geom::snap::snap_fixed_cell(trap_obb, grid_size, cell_x, cell_y, is_occupied);
            if ideal.distance(&adjusted) > f64::EPSILON {
                (ideal, Some(adjusted))
            } else {
                (ideal, None)
            }
        }
    }
}

/// Resolves a trap immediately after its primary action has run with no
/// success/failure macros and no configured checks to gate on — §4.5's edge
/// case (a), reused verbatim by §4.6's "if there is a `lockedTokenId`,
/// release-with-commit; else directly decrement uses" post-check resolution.
pub fn resolve_primary_only(
    host: &mut dyn HostPort,
    locks: &mut LockRegistry,
    toggles: &GlobalToggles,
    locked_token_id: Option<&TokenId>,
    trap_id: &TrapId,
    now_ms: u64,
) -> Result<(), EngineError> {
    if let Some(token_id) = locked_token_id {
        locks.mark_macro_triggered(token_id);
        locks.release(host, token_id, true, toggles, now_ms)?;
    } else {
        crate::lock::deplete_trap_use(host, trap_id, toggles, now_ms)?;
    }
    Ok(())
}

/// Handles one non-trap token's position change (`prev` → `curr`), running
/// the full six-step algorithm of §4.5 against every trap on `page_id`.
///
/// Stops at the first trap that registers a hit (edge case (b): "early-return
/// after one trap hits to prevent cascade within one event"). Returns `None`
/// if no short-circuit trips and no trap hit.
#[allow(clippy::too_many_arguments)]
pub async fn handle_movement(
    host: &mut dyn HostPort,
    locks: &mut LockRegistry,
    pending_checks: &mut PendingCheckStore,
    toggles: &GlobalToggles,
    page_id: &PageId,
    token_id: &TokenId,
    prev: Vec2,
    curr: Vec2,
    now_ms: u64,
) -> Result<Option<HostEffect>, EngineError> {
    if !toggles.triggers_enabled {
        return Ok(None);
    }

    let Some(token_graphic) = host.graphic(token_id) else {
        return Ok(None);
    };
    if token_graphic.layer != Layer::Object {
        return Ok(None);
    }
    if is_immune(&token_graphic) {
        return Ok(None);
    }

    let Some(page) = host.page(page_id) else {
        return Ok(None);
    };
    if prev.distance(&curr) < MIN_MOVEMENT_FRACTION * page.grid_size {
        return Ok(None);
    }

    if locks.take_free_move(token_id) {
        return Ok(None);
    }

    let mover_obb = Obb::new(curr, token_graphic.width, token_graphic.height, token_graphic.rotation);
    let other_graphics = host.graphics_on_page(page_id);

    for trap_graphic in &other_graphics {
        if trap_graphic.id == *token_id {
            continue;
        }
        if trap_notes_codec::parser::find_block(&trap_graphic.notes, "traptrigger").is_none() {
            continue;
        }

        let config = match trap_notes_codec::decode_notes(&trap_graphic.notes) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(trap = %trap_graphic.id, error = %err, "skipping unparsable trap");
                continue;
            }
        };
        if !config.is_effectively_armed() {
            continue;
        }
        if config.is_interaction() && !config.movement_trigger {
            continue;
        }

        let trap_obb = Obb::new(trap_graphic.center, trap_graphic.width, trap_graphic.height, trap_graphic.rotation);
        let raw_point = trap_obb
            .segment_intersect(prev, curr, page.grid_size, MIN_MOVEMENT_FRACTION)
            .or_else(|| (grid_overlap_fraction(&mover_obb, &trap_obb) >= GRID_OVERLAP_MIN_FRACTION).then_some(curr));

        let Some(raw_point) = raw_point else {
            continue;
        };

        let trap_id = TrapId::from(trap_graphic.id.as_str());
        let (immediate, delayed_final) =
            compute_snap(&trap_obb, config.position, raw_point, page.grid_size, &other_graphics, token_id);

        let mut moved_token = token_graphic.clone();
        moved_token.center = immediate;
        if let Err(err) = host.set_graphic(moved_token) {
            host.whisper(&Recipient::Gm, &format!("could not move {token_id} onto {trap_id}: {err}"));
            continue;
        }

        if let Some(final_point) = delayed_final {
            host.schedule_delayed_move(token_id.clone(), final_point, OCCUPANCY_MOVE_DELAY_MS).await;
        }
        let lock_point = delayed_final.unwrap_or(immediate);

        if let Err(err) = locks.acquire(
            host,
            token_id.clone(),
            trap_id.clone(),
            lock_point,
            trap_graphic.center,
            trap_graphic.rotation,
            config.clone(),
        ) {
            host.whisper(&Recipient::Gm, &format!("could not lock {token_id} to {trap_id}: {err}"));
            continue;
        }

        if config.trap_type == TrapType::Standard {
            host.whisper(
                &Recipient::Gm,
                &format!("Control Panel for {trap_id}: trigger the primary action or an option ({token_id} is locked)."),
            );
            return Ok(Some(HostEffect::ControlPanelShown {
                trap_id,
                token_id: token_id.clone(),
            }));
        }

        // type == Interaction
        if config.auto_trigger && config.primary_macro.is_some() {
            if let Some(primary) = &config.primary_macro {
                let ctx = ActionContext {
                    trap_id: &trap_id,
                    trapped_token_id: Some(token_id),
                    target_token_id: None,
                    extra_tags: &HashMap::new(),
                    origin: trap_graphic.center,
                    page_id,
                };
                if let Err(err) = run_action(host, primary, &ctx).await {
                    host.whisper(&Recipient::Gm, &format!("primary action for {trap_id} failed: {err}"));
                }
            }

            if config.checks.is_empty() {
                resolve_primary_only(host, locks, toggles, Some(token_id), &trap_id, now_ms)?;
                return Ok(Some(HostEffect::LockReleased {
                    token_id: token_id.clone(),
                    committed: true,
                }));
            }

            let character_id = token_graphic.represents.clone();
            let character_name = character_id.as_ref().and_then(|id| host.character(id)).map(|c| c.name);
            pending_checks.create(PendingCheck {
                trap_id: trap_id.clone(),
                check_ref: CheckRef::Index(0),
                frozen_check: config.checks[0].clone(),
                advantage_mode: AdvantageMode::Normal,
                first_roll: None,
                initiator_id: PlayerId::from(GM_PLAYER_ID),
                character_id,
                character_name,
                locked_token_id: Some(token_id.clone()),
                mismatched_total: None,
            });
            host.whisper(
                &Recipient::Gm,
                &format!("GM Response menu for {trap_id}: awaiting a skill-check roll."),
            );
            return Ok(Some(HostEffect::GmResponseMenuShown { trap_id }));
        }

        host.whisper(
            &Recipient::Gm,
            &format!("Interaction Menu for {trap_id}: Trigger Action / Explain Action / Allow Move."),
        );
        return Ok(Some(HostEffect::InteractionMenuShown {
            trap_id,
            token_id: token_id.clone(),
        }));
    }

    Ok(None)
}
