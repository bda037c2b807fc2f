// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end scenarios driving `EngineState` against `MockHost`, one page at
//! a time, the way a real host adapter would: a token move becomes a
//! `handle_graphic_change` call, a door flip becomes `handle_door_change`, and
//! every `!trapsystem` line goes through `handle_chat_command`.

use trap_domain::{
    AdvantageMode, CharacterId, CheckRef, CheckSpec, PageId, PendingCheck, PlayerId, TokenId, TrapId,
};
use trap_engine::{passive, EngineState, HostEffect, PassiveSettings};
use trap_geom::Vec2;
use trap_host::types::{Character, Door, Graphic, Layer, Page, Recipient};
use trap_host::{HostPort, MockHost};

const PAGE: &str = "page-1";
const GM: &str = "gm";

fn page() -> Page {
    Page {
        id: PageId::from(PAGE),
        grid_size: 70.0,
        scale: 5.0,
    }
}

fn graphic(id: &str, center: Vec2, width: f64, height: f64, notes: &str) -> Graphic {
    Graphic {
        id: TokenId::from(id),
        page_id: PageId::from(PAGE),
        center,
        width,
        height,
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

/// Scenario 1 (§8.1): a standard trap locks the mover, the GM fires its
/// primary action off the Control Panel via `marktriggered`, and that single
/// action both runs the macro and commits the use.
#[tokio::test]
async fn standard_trap_locks_fires_primary_and_depletes_a_use() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    host.put_macro("Explode", "<&trap> hits <&trapped> with spikes!");
    host.put_graphic(graphic(
        "trap-1",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        r#"{!traptrigger type:[standard] uses:[1/1] armed:[on] primary:["#Explode"] position:[center]}"#,
    ));
    let before = graphic("tok", Vec2::new(630.0, 700.0), 70.0, 70.0, "");
    host.put_graphic(before.clone());
    let mut state = EngineState::new();

    let mut after = before.clone();
    after.center = Vec2::new(770.0, 700.0);
    let effects = state.handle_graphic_change(&mut host, &PageId::from(PAGE), &before, after, 0).await;

    assert!(matches!(
        effects.as_slice(),
        [HostEffect::ControlPanelShown { trap_id, token_id }]
            if *trap_id == TrapId::from("trap-1") && *token_id == TokenId::from("tok")
    ));
    assert!(state.locks.is_locked(&TokenId::from("tok")));
    assert_eq!(host.graphic(&TokenId::from("tok")).expect("present").center, Vec2::new(700.0, 700.0));

    let effects = state
        .handle_chat_command(
            &mut host,
            &PageId::from(PAGE),
            "!trapsystem marktriggered tok trap-1 primary",
            None,
            &PlayerId::from(GM),
            1,
        )
        .await;

    assert!(matches!(
        effects.as_slice(),
        [HostEffect::LockReleased { token_id, committed: true }] if *token_id == TokenId::from("tok")
    ));
    assert!(!state.locks.is_locked(&TokenId::from("tok")));

    let delivery = host.deliveries.last().expect("one delivery");
    match delivery {
        trap_host::mock::Delivery::Chat { message, .. } => {
            assert_eq!(message.body, "trap-1 hits tok with spikes!");
        }
        other => panic!("expected a chat delivery, got {other:?}"),
    }

    let trap = host.graphic(&TokenId::from("trap-1")).expect("present");
    assert!(trap.notes.contains("uses:[0/1]"));
    let config = trap_notes_codec::decode_notes(&trap.notes).expect("decodes");
    assert!(!config.is_effectively_armed());
}

/// Scenario 2 (§8.2): an auto-triggering interaction trap opens a pending
/// check on movement, and a qualifying roll runs its success action and
/// commits one use.
#[tokio::test]
async fn interaction_trap_auto_trigger_success_path_commits_a_use() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    host.put_macro("Safe", "Nothing happens.");
    host.put_graphic(graphic(
        "trap-2",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        r#"{!traptrigger type:[interaction] uses:[2/2] armed:[on] auto:[on] check1type:["Perception"] check1dc:[12] success:["#Safe"] failure:["!Hurt"]}"#,
    ));
    let before = graphic("tok", Vec2::new(630.0, 700.0), 70.0, 70.0, "");
    host.put_graphic(before.clone());
    let mut state = EngineState::new();

    let mut after = before.clone();
    after.center = Vec2::new(770.0, 700.0);
    let effects = state.handle_graphic_change(&mut host, &PageId::from(PAGE), &before, after, 0).await;
    assert!(matches!(effects.as_slice(), [HostEffect::GmResponseMenuShown { trap_id }] if *trap_id == TrapId::from("trap-2")));
    assert!(state.pending_checks.by_initiator(&PlayerId::from(GM)).is_some());

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem rollcheck 14 Perception", None, &PlayerId::from(GM), 100)
        .await;

    assert!(matches!(
        effects.as_slice(),
        [HostEffect::CheckResolved { trap_id, success: true }] if *trap_id == TrapId::from("trap-2")
    ));
    assert!(!state.locks.is_locked(&TokenId::from("tok")));
    assert!(state.pending_checks.by_initiator(&PlayerId::from(GM)).is_none());

    let trap = host.graphic(&TokenId::from("trap-2")).expect("present");
    assert!(trap.notes.contains("uses:[1/2]"));
    assert!(host.deliveries.iter().any(|d| matches!(
        d,
        trap_host::mock::Delivery::Chat { message, .. } if message.body == "Nothing happens."
    )));
}

/// Scenario 3 (§8.3, §4.6's advantage semantics): a manual two-step
/// advantage roll is stored and combined on the second submission.
#[tokio::test]
async fn two_step_advantage_roll_combines_to_the_higher_total() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    host.put_macro("Safe", "Click. Nothing.");
    host.put_graphic(graphic(
        "trap-3",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        r#"{!traptrigger type:[interaction] uses:[1/1] armed:[on] success:["#Safe"] failure:["!Hurt"]}"#,
    ));
    host.put_graphic(graphic("tok", Vec2::new(700.0, 700.0), 70.0, 70.0, ""));
    let mut state = EngineState::new();
    state
        .locks
        .acquire(
            &mut host,
            TokenId::from("tok"),
            TrapId::from("trap-3"),
            Vec2::new(700.0, 700.0),
            Vec2::new(700.0, 700.0),
            0.0,
            trap_domain::TrapConfig::default(),
        )
        .expect("acquires");
    state.pending_checks.create(PendingCheck {
        trap_id: TrapId::from("trap-3"),
        check_ref: CheckRef::Index(0),
        frozen_check: CheckSpec {
            skill_type: "Perception".to_string(),
            dc: 12,
        },
        advantage_mode: AdvantageMode::Advantage,
        first_roll: None,
        initiator_id: PlayerId::from(GM),
        character_id: None,
        character_name: None,
        locked_token_id: Some(TokenId::from("tok")),
        mismatched_total: None,
    });

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem rollcheck 8 Perception", None, &PlayerId::from(GM), 0)
        .await;
    assert!(matches!(effects.as_slice(), [HostEffect::AwaitingSecondRoll { .. }]));
    assert_eq!(state.pending_checks.by_initiator(&PlayerId::from(GM)).expect("still pending").first_roll, Some(8));

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem rollcheck 17 Perception", None, &PlayerId::from(GM), 0)
        .await;
    assert!(matches!(
        effects.as_slice(),
        [HostEffect::CheckResolved { trap_id, success: true }] if *trap_id == TrapId::from("trap-3")
    ));
    assert!(!state.locks.is_locked(&TokenId::from("tok")));
}

/// Scenario 4 (§8.4): a closed door blocks the passive-spot line of sight;
/// opening it and re-scanning the page lets the same pair fire.
#[tokio::test]
async fn opening_a_door_unblocks_los_and_fires_a_page_wide_passive_scan() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    host.put_graphic(graphic(
        "trap-4",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        r#"{!traptrigger type:[standard] uses:[1/1] armed:[on]} {!trapdetection dc:[12] range:[30] aura:[true]}"#,
    ));
    let char_id = CharacterId::from("char-1");
    host.put_character(Character {
        id: char_id.clone(),
        name: "Rogue".to_string(),
        controlled_by: vec![PlayerId::from("player-1")],
    });
    host.set_sheet_item(char_id.clone(), "passive_wisdom", 15.0);
    let mut observer = graphic("obs-1", Vec2::new(700.0, 670.0), 70.0, 70.0, "");
    observer.represents = Some(char_id);
    host.put_graphic(observer);
    host.put_door(Door {
        id: TokenId::from("door-1"),
        page_id: PageId::from(PAGE),
        segment: (Vec2::new(650.0, 685.0), Vec2::new(750.0, 685.0)),
        is_open: false,
    });
    let mut state = EngineState::new();

    let before = Door {
        id: TokenId::from("door-1"),
        page_id: PageId::from(PAGE),
        segment: (Vec2::new(650.0, 685.0), Vec2::new(750.0, 685.0)),
        is_open: false,
    };
    let after = Door { is_open: true, ..before.clone() };
    let effects = state.handle_door_change(&mut host, &PageId::from(PAGE), &before, &after, 0).await;

    assert!(matches!(effects.as_slice(), [HostEffect::PassiveSpotFired { trap_id, .. }] if *trap_id == TrapId::from("trap-4")));
    assert_eq!(host.deliveries.len(), 2);
    let trap = host.graphic(&TokenId::from("trap-4")).expect("present");
    assert!(trap.notes.contains("detected:[on]"));
}

/// Scenario 5 (§8.5): the player-facing half of a passive notice debounces
/// within the sliding window while the GM is whispered unconditionally every
/// time — the GM never misses a spot, but a player isn't spammed with
/// back-to-back identical messages.
#[tokio::test]
async fn identical_player_notices_debounce_but_gm_is_whispered_every_time() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    let same_notice = r#"noticeplayer:["You sense something is watching you."]"#;
    host.put_graphic(graphic(
        "trap-a",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        &format!(r#"{{!traptrigger type:[standard]}} {{!trapdetection dc:[1] range:[100] {same_notice}}}"#),
    ));
    host.put_graphic(graphic(
        "trap-b",
        Vec2::new(700.0, 740.0),
        70.0,
        70.0,
        &format!(r#"{{!traptrigger type:[standard]}} {{!trapdetection dc:[1] range:[100] {same_notice}}}"#),
    ));
    let char_id = CharacterId::from("char-1");
    host.put_character(Character {
        id: char_id.clone(),
        name: "Rogue".to_string(),
        controlled_by: vec![PlayerId::from("player-1")],
    });
    host.set_sheet_item(char_id.clone(), "passive_wisdom", 30.0);
    let mut observer = graphic("obs-1", Vec2::new(700.0, 670.0), 70.0, 70.0, "");
    observer.represents = Some(char_id);
    host.put_graphic(observer.clone());

    let mut ledger = trap_domain::PassiveLedger::default();
    let trap_a = host.graphic(&TokenId::from("trap-a")).expect("present");
    let effect_a = passive::single_check(
        &mut host,
        &mut ledger,
        PassiveSettings::default(),
        &TrapId::from("trap-a"),
        &trap_a,
        "Trap A",
        &observer,
        0,
    )
    .await;
    assert!(effect_a.is_some());

    let trap_b = host.graphic(&TokenId::from("trap-b")).expect("present");
    let effect_b = passive::single_check(
        &mut host,
        &mut ledger,
        PassiveSettings::default(),
        &TrapId::from("trap-b"),
        &trap_b,
        "Trap B",
        &observer,
        1_000,
    )
    .await;
    assert!(effect_b.is_some());

    let whispers: Vec<_> = host
        .deliveries
        .iter()
        .filter_map(|d| match d {
            trap_host::mock::Delivery::Whisper { to, body } => Some((to.clone(), body.clone())),
            trap_host::mock::Delivery::Chat { .. } => None,
        })
        .collect();
    let gm_whispers = whispers.iter().filter(|(to, _)| *to == Recipient::Gm).count();
    let player_whispers = whispers.iter().filter(|(to, _)| *to == Recipient::Player(PlayerId::from("player-1"))).count();
    assert_eq!(gm_whispers, 2, "the GM hears about every spot, debounced or not");
    assert_eq!(player_whispers, 1, "the second identical notice is debounced for the player");
}

/// Scenario 6 (§8.6, §4.6 stage "verify skill compatibility"): a skill
/// mismatch opens GM arbitration and leaves the pending check intact;
/// overriding the expected skill (the GM's "Accept") lets the original total
/// resolve against the original DC.
#[tokio::test]
async fn skill_mismatch_opens_arbitration_then_resolves_after_override() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    host.put_macro("Safe", "Nothing happens.");
    host.put_graphic(graphic(
        "trap-6",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        r#"{!traptrigger type:[interaction] uses:[1/1] armed:[on] success:["#Safe"] failure:["!Hurt"]}"#,
    ));
    let mut state = EngineState::new();
    state.pending_checks.create(PendingCheck {
        trap_id: TrapId::from("trap-6"),
        check_ref: CheckRef::Index(0),
        frozen_check: CheckSpec {
            skill_type: "Perception".to_string(),
            dc: 12,
        },
        advantage_mode: AdvantageMode::Normal,
        first_roll: None,
        initiator_id: PlayerId::from(GM),
        character_id: None,
        character_name: None,
        locked_token_id: None,
        mismatched_total: None,
    });

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem rollcheck 14 Investigation", None, &PlayerId::from(GM), 0)
        .await;
    assert!(matches!(effects.as_slice(), [HostEffect::MismatchArbitrationShown { .. }]));
    assert!(state.pending_checks.by_initiator(&PlayerId::from(GM)).is_some(), "rejecting leaves the check intact");

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem customcheck Investigation 12", None, &PlayerId::from(GM), 0)
        .await;
    assert!(effects.is_empty());

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem rollcheck 14 Investigation", None, &PlayerId::from(GM), 0)
        .await;
    assert!(matches!(
        effects.as_slice(),
        [HostEffect::CheckResolved { trap_id, success: true }] if *trap_id == TrapId::from("trap-6")
    ));
}

/// Scenario 6's other branch (§8.6): instead of overriding the expected
/// skill, the GM accepts the mismatched roll as-is, and it scores against
/// the original DC without a reroll.
#[tokio::test]
async fn skill_mismatch_accept_scores_the_original_roll_against_the_frozen_dc() {
    let mut host = MockHost::new(1);
    host.put_page(page());
    host.put_macro("Safe", "Nothing happens.");
    host.put_graphic(graphic(
        "trap-7",
        Vec2::new(700.0, 700.0),
        70.0,
        70.0,
        r#"{!traptrigger type:[interaction] uses:[1/1] armed:[on] success:["#Safe"] failure:["!Hurt"]}"#,
    ));
    let mut state = EngineState::new();
    state.pending_checks.create(PendingCheck {
        trap_id: TrapId::from("trap-7"),
        check_ref: CheckRef::Index(0),
        frozen_check: CheckSpec {
            skill_type: "Perception".to_string(),
            dc: 12,
        },
        advantage_mode: AdvantageMode::Normal,
        first_roll: None,
        initiator_id: PlayerId::from(GM),
        character_id: None,
        character_name: None,
        locked_token_id: None,
        mismatched_total: None,
    });

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem rollcheck 14 Investigation", None, &PlayerId::from(GM), 0)
        .await;
    assert!(matches!(effects.as_slice(), [HostEffect::MismatchArbitrationShown { .. }]));
    assert_eq!(
        state
            .pending_checks
            .by_initiator(&PlayerId::from(GM))
            .expect("still pending")
            .mismatched_total,
        Some(14)
    );

    let effects = state
        .handle_chat_command(&mut host, &PageId::from(PAGE), "!trapsystem resolvemismatch accept", None, &PlayerId::from(GM), 0)
        .await;
    assert!(matches!(
        effects.as_slice(),
        [HostEffect::CheckResolved { trap_id, success: true }] if *trap_id == TrapId::from("trap-7")
    ));
    assert!(state.pending_checks.by_initiator(&PlayerId::from(GM)).is_none());
    assert!(host.deliveries.iter().any(|d| matches!(
        d,
        trap_host::mock::Delivery::Chat { message, .. } if message.body == "Nothing happens."
    )));
}
