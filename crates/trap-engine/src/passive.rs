// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passive Sensor (C8): the per-`(observer, trap)` detection gate chain (§4.8).

use crate::effect::HostEffect;
use trap_domain::{ObserverKey, PageId, PassiveLedger, TrapId};
use trap_geom::{segments_intersect, Vec2};
use trap_host::types::{BarrierType, Graphic, Recipient};
use trap_host::HostPort;

const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 100_000;

/// Tunable parameters for a passive-sensor pass; everything besides the
/// debounce window comes straight from the detection block under test.
#[derive(Debug, Clone, Copy)]
pub struct PassiveSettings {
    /// Sliding debounce window for player messages, in milliseconds.
    pub debounce_window_ms: u64,
}

impl Default for PassiveSettings {
    fn default() -> Self {
        Self {
            debounce_window_ms: DEFAULT_DEBOUNCE_WINDOW_MS,
        }
    }
}

fn observer_key_for(observer: &Graphic) -> ObserverKey {
    observer
        .represents
        .clone()
        .map_or_else(|| ObserverKey::Token(observer.id.clone()), ObserverKey::Character)
}

/// Whether any wall path or closed door on `page_id` blocks the segment from
/// `from` to `to`. One-way walls block like normal walls; windows never
/// block.
fn line_of_sight_blocked(host: &dyn HostPort, page_id: &PageId, from: Vec2, to: Vec2) -> bool {
    let blocked_by_walls = host.paths_on_page(page_id).into_iter().any(|path| {
        path.barrier_type != BarrierType::Transparent
            && path
                .points
                .windows(2)
                .any(|edge| segments_intersect(from, to, edge[0], edge[1]))
    });
    if blocked_by_walls {
        return true;
    }

    host.doors_on_page(page_id)
        .into_iter()
        .any(|door| !door.is_open && segments_intersect(from, to, door.segment.0, door.segment.1))
}

fn read_bar(graphic: &Graphic, bar_name: &str) -> Option<f64> {
    match bar_name {
        "bar1" => graphic.bar1_value,
        "bar2" => graphic.bar2_value,
        _ => None,
    }
}

fn render_template(template: &str, placeholders: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in placeholders {
        out = out.replace(&format!("{{{name}}}"), value);
    }
    out
}

/// Runs one `(observer, trap)` passive-perception check, mutating `ledger`
/// and the trap's notes/visuals on a successful spot. Returns the fired
/// effect, or `None` if any gate failed or the pair had already been
/// resolved.
///
/// Every failure mode documented in §4.8 (no detection block, already
/// spotted, LOS blocked, out of range, no derivable `basePP`) is a silent
/// skip, not an error — matching error taxonomy category 5's "recovered
/// locally" policy.
pub async fn single_check(
    host: &mut dyn HostPort,
    ledger: &mut PassiveLedger,
    settings: PassiveSettings,
    trap_id: &TrapId,
    trap_graphic: &Graphic,
    trap_name: &str,
    observer_graphic: &Graphic,
    now_ms: u64,
) -> Option<HostEffect> {
    let mut config = trap_notes_codec::decode_notes(&trap_graphic.notes).ok()?;
    let detection = config.detection.clone()?;
    if !detection.passive_enabled {
        return None;
    }

    let observer_key = observer_key_for(observer_graphic);
    if ledger.has_spotted(trap_id, &observer_key) {
        return None;
    }

    if line_of_sight_blocked(host, &trap_graphic.page_id, observer_graphic.center, trap_graphic.center) {
        return None;
    }

    let page = host.page(&trap_graphic.page_id)?;
    let distance_px = observer_graphic.center.distance(&trap_graphic.center);
    let distance_map_units = trap_geom::units::pixels_to_map_units(distance_px, page.grid_size, page.scale);
    if let Some(max_range) = detection.passive_max_range {
        if distance_map_units > max_range {
            return None;
        }
    }

    let character_id = observer_graphic.represents.clone();
    let base_pp = if let Some(character_id) = &character_id {
        if let Some(value) = host.read_sheet_item(character_id, "passive_wisdom").await {
            Some(value)
        } else if let Some(value) = host.read_attribute(character_id, "passive_wisdom") {
            Some(value)
        } else {
            detection
                .pp_token_bar_fallback
                .as_deref()
                .and_then(|bar| read_bar(observer_graphic, bar))
        }
    } else {
        detection
            .pp_token_bar_fallback
            .as_deref()
            .and_then(|bar| read_bar(observer_graphic, bar))
    }?;
    #[allow(clippy::cast_possible_truncation)]
    let base_pp = base_pp.round() as i32;

    let luck_bonus = if detection.enable_luck_roll {
        detection.luck_roll_die.map_or(0, |die| host.roll_dice(die.count, die.sides))
    } else {
        0
    };
    let final_pp = base_pp + luck_bonus;
    let spot_dc = detection.passive_spot_dc?;
    if final_pp < spot_dc {
        return None;
    }

    ledger.mark_spotted(trap_id.clone(), observer_key.clone());
    config.detection = Some(trap_domain::DetectionConfig {
        detected: true,
        ..detection.clone()
    });
    let mut updated_graphic = trap_graphic.clone();
    updated_graphic.notes = trap_notes_codec::encode_notes(&trap_graphic.notes, &config);
    let toggles = trap_domain::GlobalToggles::default();
    let visual = trap_visual::derive_visual_state(&config, &toggles, 0.0, now_ms);
    updated_graphic.aura2_radius = visual.detection_aura_radius;
    let _ = host.set_graphic(updated_graphic);

    let char_name = character_id
        .as_ref()
        .and_then(|id| host.character(id))
        .map_or_else(|| observer_graphic.id.to_string(), |c| c.name);

    let placeholders: Vec<(&str, String)> = vec![
        ("charName", char_name.clone()),
        ("trapName", trap_name.to_string()),
        ("charPP", final_pp.to_string()),
        ("trapDC", spot_dc.to_string()),
        ("distanceToTrap", format!("{distance_map_units:.1}")),
        ("luckBonus", luck_bonus.to_string()),
        ("basePP", base_pp.to_string()),
    ];

    let gm_body = detection
        .passive_notice_gm
        .as_deref()
        .map_or_else(|| format!("{char_name} spotted {trap_name}."), |tpl| render_template(tpl, &placeholders));
    host.whisper(&Recipient::Gm, &gm_body);

    if let Some(character_id) = &character_id {
        if let Some(character) = host.character(character_id).filter(trap_host::types::Character::has_non_gm_controller) {
            let player_body = detection
                .passive_notice_player
                .as_deref()
                .map_or_else(|| format!("You notice something suspicious near {trap_name}."), |tpl| {
                    render_template(tpl, &placeholders)
                });
            if !ledger.is_debounced(character_id, &player_body, now_ms, settings.debounce_window_ms) {
                for controller in &character.controlled_by {
                    host.whisper(&Recipient::Player(controller.clone()), &player_body);
                }
                ledger.record_sent(character_id.clone(), player_body, now_ms);
            }
        }
    }

    Some(HostEffect::PassiveSpotFired {
        trap_id: trap_id.clone(),
        observer: observer_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trap_domain::{CharacterId, DieRoll, PlayerId};
    use trap_host::types::{Character, Layer, Page, PathObj};
    use trap_host::MockHost;

    fn trap_graphic(notes: &str) -> Graphic {
        Graphic {
            id: TokenId_::from("trap-1"),
            page_id: PageId::from("page-1"),
            center: Vec2::new(700.0, 700.0),
            width: 70.0,
            height: 70.0,
            rotation: 0.0,
            notes: notes.to_string(),
            layer: Layer::Object,
            status_markers: Vec::new(),
            represents: None,
            aura1_radius: None,
            aura1_color: None,
            aura2_radius: None,
            aura2_color: None,
            bar1_value: None,
            bar1_max: None,
            bar2_value: None,
        }
    }

    use trap_domain::TokenId as TokenId_;

    fn observer_graphic(id: &str, character_id: Option<CharacterId>, center: Vec2) -> Graphic {
        Graphic {
            id: TokenId_::from(id),
            page_id: PageId::from("page-1"),
            center,
            width: 70.0,
            height: 70.0,
            rotation: 0.0,
            notes: String::new(),
            layer: Layer::Object,
            status_markers: Vec::new(),
            represents: character_id,
            aura1_radius: None,
            aura1_color: None,
            aura2_radius: None,
            aura2_color: None,
            bar1_value: None,
            bar1_max: None,
            bar2_value: None,
        }
    }

    fn host_with_page() -> MockHost {
        let mut host = MockHost::new(1);
        host.put_page(Page {
            id: PageId::from("page-1"),
            grid_size: 70.0,
            scale: 5.0,
        });
        host
    }

    #[tokio::test]
    async fn spots_trap_and_fires_effect_when_all_gates_pass() {
        let mut host = host_with_page();
        let trap = trap_graphic(
            r#"{!traptrigger type:[standard] uses:[1/1] armed:[on]} {!trapdetection dc:[12] range:[30] aura:[true]}"#,
        );
        host.put_graphic(trap.clone());
        let char_id = CharacterId::from("char-1");
        host.put_character(Character {
            id: char_id.clone(),
            name: "Rogue".to_string(),
            controlled_by: vec![PlayerId::from("player-1")],
        });
        host.set_sheet_item(char_id.clone(), "passive_wisdom", 15.0);
        let observer = observer_graphic("obs-1", Some(char_id), Vec2::new(700.0, 670.0));
        host.put_graphic(observer.clone());

        let mut ledger = PassiveLedger::default();
        let effect = single_check(
            &mut host,
            &mut ledger,
            PassiveSettings::default(),
            &TrapId::from("trap-1"),
            &trap,
            "Pit Trap",
            &observer,
            0,
        )
        .await;

        assert!(effect.is_some());
        assert!(ledger.has_spotted(&TrapId::from("trap-1"), &ObserverKey::Character(CharacterId::from("char-1"))));
        assert_eq!(host.deliveries.len(), 2);
    }

    #[tokio::test]
    async fn already_spotted_pair_is_skipped() {
        let mut host = host_with_page();
        let trap = trap_graphic(r#"{!traptrigger type:[standard]} {!trapdetection dc:[12] range:[30]}"#);
        host.put_graphic(trap.clone());
        let observer = observer_graphic("obs-1", None, Vec2::new(700.0, 670.0));
        host.put_graphic(observer.clone());

        let mut ledger = PassiveLedger::default();
        ledger.mark_spotted(TrapId::from("trap-1"), ObserverKey::Token(TokenId_::from("obs-1")));

        let effect = single_check(
            &mut host,
            &mut ledger,
            PassiveSettings::default(),
            &TrapId::from("trap-1"),
            &trap,
            "Pit Trap",
            &observer,
            0,
        )
        .await;
        assert!(effect.is_none());
    }

    #[tokio::test]
    async fn closed_door_on_segment_blocks_los() {
        let mut host = host_with_page();
        let trap = trap_graphic(r#"{!traptrigger type:[standard]} {!trapdetection dc:[1] range:[100]}"#);
        host.put_graphic(trap.clone());
        host.put_door(trap_host::types::Door {
            id: TokenId_::from("door-1"),
            page_id: PageId::from("page-1"),
            segment: (Vec2::new(650.0, 685.0), Vec2::new(750.0, 685.0)),
            is_open: false,
        });
        let char_id = CharacterId::from("char-1");
        host.set_sheet_item(char_id.clone(), "passive_wisdom", 30.0);
        let observer = observer_graphic("obs-1", Some(char_id), Vec2::new(700.0, 670.0));
        host.put_graphic(observer.clone());

        let mut ledger = PassiveLedger::default();
        let effect = single_check(
            &mut host,
            &mut ledger,
            PassiveSettings::default(),
            &TrapId::from("trap-1"),
            &trap,
            "Pit Trap",
            &observer,
            0,
        )
        .await;
        assert!(effect.is_none());
    }

    #[tokio::test]
    async fn out_of_range_observer_is_skipped() {
        let mut host = host_with_page();
        let trap = trap_graphic(r#"{!traptrigger type:[standard]} {!trapdetection dc:[1] range:[5]}"#);
        host.put_graphic(trap.clone());
        let char_id = CharacterId::from("char-1");
        host.set_sheet_item(char_id.clone(), "passive_wisdom", 30.0);
        let observer = observer_graphic("obs-1", Some(char_id), Vec2::new(0.0, 0.0));
        host.put_graphic(observer.clone());

        let mut ledger = PassiveLedger::default();
        let effect = single_check(
            &mut host,
            &mut ledger,
            PassiveSettings::default(),
            &TrapId::from("trap-1"),
            &trap,
            "Pit Trap",
            &observer,
            0,
        )
        .await;
        assert!(effect.is_none());
    }

    #[tokio::test]
    async fn luck_roll_can_push_final_pp_over_dc() {
        let mut host = host_with_page();
        let trap = trap_graphic(
            r#"{!traptrigger type:[standard]} {!trapdetection dc:[18] range:[30] luck:[true]}"#,
        );
        host.put_graphic(trap.clone());
        let char_id = CharacterId::from("char-1");
        host.set_sheet_item(char_id.clone(), "passive_wisdom", 14.0);
        let observer = observer_graphic("obs-1", Some(char_id), Vec2::new(700.0, 670.0));
        host.put_graphic(observer.clone());

        let mut config = trap_notes_codec::decode_notes(&trap.notes).expect("decodes");
        config.detection.as_mut().expect("detection").luck_roll_die = Some(DieRoll::new(1, 20));
        host.put_graphic(Graphic {
            notes: trap_notes_codec::encode_notes(&trap.notes, &config),
            ..trap.clone()
        });

        let mut ledger = PassiveLedger::default();
        let effect = single_check(
            &mut host,
            &mut ledger,
            PassiveSettings::default(),
            &TrapId::from("trap-1"),
            &host.graphic(&TokenId_::from("trap-1")).expect("present"),
            "Pit Trap",
            &observer,
            0,
        )
        .await;
        assert!(effect.is_some());
    }

    #[tokio::test]
    async fn no_non_gm_controller_sends_gm_only() {
        let mut host = host_with_page();
        let trap = trap_graphic(r#"{!traptrigger type:[standard]} {!trapdetection dc:[1] range:[30]}"#);
        host.put_graphic(trap.clone());
        let char_id = CharacterId::from("char-1");
        host.put_character(Character {
            id: char_id.clone(),
            name: "Unowned NPC".to_string(),
            controlled_by: Vec::new(),
        });
        host.set_sheet_item(char_id.clone(), "passive_wisdom", 30.0);
        let observer = observer_graphic("obs-1", Some(char_id), Vec2::new(700.0, 670.0));
        host.put_graphic(observer.clone());

        let mut ledger = PassiveLedger::default();
        let effect = single_check(
            &mut host,
            &mut ledger,
            PassiveSettings::default(),
            &TrapId::from("trap-1"),
            &trap,
            "Pit Trap",
            &observer,
            0,
        )
        .await;
        assert!(effect.is_some());
        assert_eq!(host.deliveries.len(), 1);
    }
}
