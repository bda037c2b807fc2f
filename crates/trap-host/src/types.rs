// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plain-data value types mirroring the host's object model (§6).

use trap_domain::{CharacterId, PageId, PlayerId, TokenId};
use trap_geom::Vec2;

/// Which layer a graphic sits on. Only `Object` layer tokens participate in
/// trap triggering and passive scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// The token/object layer — movable tokens and trap objects live here.
    Object,
    /// The GM-only layer.
    GmLayer,
    /// The background map layer.
    Map,
    /// The dynamic-lighting/walls layer.
    Walls,
}

/// A movable token or a trap object (both are "graphics" on the host).
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    /// Stable id.
    pub id: TokenId,
    /// Page this graphic lives on.
    pub page_id: PageId,
    /// Center position, in pixels.
    pub center: Vec2,
    /// Width, in pixels.
    pub width: f64,
    /// Height, in pixels.
    pub height: f64,
    /// Rotation, in degrees.
    pub rotation: f64,
    /// Free-form notes field (trap/detection/lock blocks live here).
    pub notes: String,
    /// Which layer the graphic is on.
    pub layer: Layer,
    /// Status markers currently applied (e.g. `"ignore-traps"`).
    pub status_markers: Vec<String>,
    /// The character this token represents, if any.
    pub represents: Option<CharacterId>,
    /// Aura 1 radius in map units, `None` if hidden.
    pub aura1_radius: Option<f64>,
    /// Aura 1 color, host-specific color name/hex.
    pub aura1_color: Option<String>,
    /// Aura 2 radius in map units, `None` if hidden.
    pub aura2_radius: Option<f64>,
    /// Aura 2 color, host-specific color name/hex.
    pub aura2_color: Option<String>,
    /// Bar 1 current value.
    pub bar1_value: Option<f64>,
    /// Bar 1 max value.
    pub bar1_max: Option<f64>,
    /// Bar 2 current value.
    pub bar2_value: Option<f64>,
}

/// How a wall-layer path blocks line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierType {
    /// Does not block line of sight.
    Transparent,
    /// Blocks line of sight from both sides.
    Normal,
    /// Blocks line of sight; treated identically to `Normal` for LOS per §4.8.
    OneWay,
}

/// A dynamic-lighting wall segment (the legacy "path" object on the walls layer).
#[derive(Debug, Clone, PartialEq)]
pub struct PathObj {
    /// Stable id.
    pub id: TokenId,
    /// Page this path lives on.
    pub page_id: PageId,
    /// Polyline vertices, in pixels.
    pub points: Vec<Vec2>,
    /// Barrier behavior for line-of-sight tests.
    pub barrier_type: BarrierType,
    /// Whether this path is a legacy door-path (participates in open/close scans).
    pub is_door_path: bool,
    /// Open/closed state, meaningful only when `is_door_path`.
    pub is_open: bool,
}

/// A modern door object.
#[derive(Debug, Clone, PartialEq)]
pub struct Door {
    /// Stable id.
    pub id: TokenId,
    /// Page this door lives on.
    pub page_id: PageId,
    /// The door's footprint segment, in pixels.
    pub segment: (Vec2, Vec2),
    /// Open/closed state. A closed door blocks line of sight.
    pub is_open: bool,
}

/// A window object. Always passes light/sight regardless of state.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Stable id.
    pub id: TokenId,
    /// Page this window lives on.
    pub page_id: PageId,
    /// The window's footprint segment, in pixels.
    pub segment: (Vec2, Vec2),
}

/// Page-level grid settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Stable id.
    pub id: PageId,
    /// Pixels per grid cell.
    pub grid_size: f64,
    /// Map units per grid cell.
    pub scale: f64,
}

/// A character sheet, with its controlling players.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    /// Stable id.
    pub id: CharacterId,
    /// Display name, used in message placeholder substitution.
    pub name: String,
    /// Controlling players. Parsed from the host's comma-separated list.
    pub controlled_by: Vec<PlayerId>,
}

impl Character {
    /// Whether any of `controlled_by` is a non-GM player.
    #[must_use]
    pub fn has_non_gm_controller(&self) -> bool {
        !self.controlled_by.is_empty()
    }
}

/// Who a whisper is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// The GM only.
    Gm,
    /// A specific player.
    Player(PlayerId),
}

/// A chat message to send, with optional template rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Who the message appears to come from (a token/character name, or the system).
    pub from: String,
    /// Raw message body (may be a `&{template:...}` payload or plain text).
    pub body: String,
}
