// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Line-oriented REPL that drives `trap-engine` against an in-memory mock
//! host, for manually exploring the scenarios the engine supports without a
//! real virtual-tabletop host attached.
//!
//! ```text
//! move <token> <x> <y>      simulate dragging a token to a new position
//! door open|close           flip the demo door's state
//! !trapsystem <verb> ...    any chat command the dispatcher understands
//! quit                      exit
//! ```

#![deny(rust_2018_idioms)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, BufReader};
use trap_app_core::ConfigService;
use trap_config_fs::FsConfigStore;
use trap_domain::{GlobalToggles, PageId, PlayerId, TokenId, TrapId};
use trap_engine::{EngineState, HostEffect};
use trap_geom::Vec2;
use trap_host::types::{Door, Graphic, Layer, Page};
use trap_host::{HostPort, MockHost};

const DEMO_PAGE: &str = "demo-page";
const DEMO_TRAP: &str = "demo-trap";
const DEMO_TOKEN: &str = "demo-token";
const DEMO_DOOR: &str = "demo-door";
const GM: &str = "gm";

/// Persisted master-toggle state, independent of `GlobalToggles`'s own shape
/// so this binary's on-disk format does not change every time the domain
/// type grows a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TogglePrefs {
    triggers_enabled: bool,
    detection_auras_hidden: bool,
}

impl Default for TogglePrefs {
    fn default() -> Self {
        let toggles = GlobalToggles::default();
        Self {
            triggers_enabled: toggles.triggers_enabled,
            detection_auras_hidden: toggles.detection_auras_hidden,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn blank_graphic(id: &str, page_id: &str, center: Vec2, notes: &str) -> Graphic {
    Graphic {
        id: TokenId::from(id),
        page_id: PageId::from(page_id),
        center,
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

fn seed_demo_world(host: &mut MockHost) {
    host.put_page(Page {
        id: PageId::from(DEMO_PAGE),
        grid_size: 70.0,
        scale: 5.0,
    });
    host.put_graphic(blank_graphic(
        DEMO_TRAP,
        DEMO_PAGE,
        Vec2::new(700.0, 700.0),
        "{!traptrigger type:[standard] uses:[1/1] armed:[on] primary:[#SpikeTrap]}",
    ));
    host.put_graphic(blank_graphic(DEMO_TOKEN, DEMO_PAGE, Vec2::new(420.0, 700.0), ""));
    host.put_door(Door {
        id: TokenId::from(DEMO_DOOR),
        page_id: PageId::from(DEMO_PAGE),
        segment: (Vec2::new(0.0, 630.0), Vec2::new(0.0, 770.0)),
        is_open: false,
    });
    host.put_macro("SpikeTrap", "/desc A spiked floor panel snaps shut.");
}

fn print_effects(effects: &[HostEffect]) {
    for effect in effects {
        println!("  -> {effect:?}");
    }
}

fn drain_deliveries(host: &mut MockHost) {
    for delivery in host.deliveries.drain(..) {
        println!("  {delivery:?}");
    }
}

async fn handle_move(rest: &str, host: &mut MockHost, state: &mut EngineState) -> Result<()> {
    let mut parts = rest.split_whitespace();
    let token = parts.next().context("move needs a token id")?;
    let x: f64 = parts.next().context("move needs an x coordinate")?.parse()?;
    let y: f64 = parts.next().context("move needs a y coordinate")?.parse()?;

    let token_id = TokenId::from(token);
    let Some(before) = host.graphic(&token_id) else {
        println!("  no such token: {token}");
        return Ok(());
    };
    let mut after = before.clone();
    after.center = Vec2::new(x, y);
    let effects = state
        .handle_graphic_change(host, &PageId::from(DEMO_PAGE), &before, after, now_ms())
        .await;
    print_effects(&effects);
    drain_deliveries(host);
    Ok(())
}

async fn handle_door(rest: &str, host: &mut MockHost, state: &mut EngineState) -> Result<()> {
    let door_id = TokenId::from(DEMO_DOOR);
    let Some(before) = host.door(&door_id) else {
        println!("  no demo door configured");
        return Ok(());
    };
    let mut after = before.clone();
    after.is_open = rest.trim() == "open";
    let effects = state
        .handle_door_change(host, &PageId::from(DEMO_PAGE), &before, &after, now_ms())
        .await;
    host.put_door(after);
    print_effects(&effects);
    drain_deliveries(host);
    Ok(())
}

async fn handle_line(line: &str, host: &mut MockHost, state: &mut EngineState) -> Result<bool> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(true);
    }
    if line == "quit" || line == "exit" {
        return Ok(false);
    }

    if let Some(rest) = line.strip_prefix("move ") {
        handle_move(rest, host, state).await?;
        return Ok(true);
    }

    if let Some(rest) = line.strip_prefix("door ") {
        handle_door(rest, host, state).await?;
        return Ok(true);
    }

    let effects = state
        .handle_chat_command(
            host,
            &PageId::from(DEMO_PAGE),
            line,
            Some(&TrapId::from(DEMO_TRAP)),
            &PlayerId::from(GM),
            now_ms(),
        )
        .await;
    print_effects(&effects);
    drain_deliveries(host);
    Ok(true)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config: Option<ConfigService<FsConfigStore>> = FsConfigStore::new().map(ConfigService::new).ok();
    let prefs: TogglePrefs = config
        .as_ref()
        .and_then(|c| c.load::<TogglePrefs>("toggles").ok().flatten())
        .unwrap_or_default();
    if let Some(cfg) = &config {
        let _ = cfg.save("toggles", &prefs);
    }

    let mut host = MockHost::new(7);
    seed_demo_world(&mut host);
    host.show_boot_banner();

    let mut state = EngineState::new();
    state.toggles.triggers_enabled = prefs.triggers_enabled;
    state.toggles.detection_auras_hidden = prefs.detection_auras_hidden;
    state.locks.rehydrate(&host, &PageId::from(DEMO_PAGE));

    println!("trap-engine-cli: demo world loaded on page {DEMO_PAGE}.");
    println!("try: move {DEMO_TOKEN} 700 700");
    println!("try: !trapsystem status");
    println!("try: door open");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match handle_line(&line, &mut host, &mut state).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => println!("  error: {err}"),
        }
    }

    if let Some(cfg) = &config {
        let prefs = TogglePrefs {
            triggers_enabled: state.toggles.triggers_enabled,
            detection_auras_hidden: state.toggles.detection_auras_hidden,
        };
        let _ = cfg.save("toggles", &prefs);
    }

    Ok(())
}
