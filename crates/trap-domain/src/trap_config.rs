// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Trap Config: the data model decoded from a map object's notes (§3).

use crate::die::DieRoll;

/// Which behavior family a trap follows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TrapType {
    /// Runs `primary_macro` / `options` directly; no skill-check dialogue.
    #[default]
    Standard,
    /// Runs a skill-check dialogue resolving to `success_macro` or `failure_macro`.
    Interaction,
}

/// Which grid cell a locked token snaps to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PositionMode {
    /// Snap to the cell nearest the raw segment↔OBB intersection.
    #[default]
    Intersection,
    /// Snap to the cell nearest the trap's own center.
    Center,
    /// Snap to a fixed cell offset within the trap's own grid, clamped to its extents.
    Fixed {
        /// Cell column offset within the trap.
        cell_x: i32,
        /// Cell row offset within the trap.
        cell_y: i32,
    },
}

/// A single skill check entry: `{skillType, dc}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSpec {
    /// Raw skill name as configured (e.g. `"Perception"`, `"Perception check"`).
    pub skill_type: String,
    /// Difficulty class to beat.
    pub dc: i32,
}

/// The detection half of a trap's configuration (present only if the
/// `{!trapdetection}` block exists on the object).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// DC an observer's passive perception must meet or beat to spot the trap.
    pub passive_spot_dc: Option<i32>,
    /// Maximum detection range, in map units.
    pub passive_max_range: Option<f64>,
    /// Whisper template fragment shown to the spotting player.
    pub passive_notice_player: Option<String>,
    /// Whisper template fragment shown to the GM.
    pub passive_notice_gm: Option<String>,
    /// Token-bar id used as a fallback source for passive perception.
    pub pp_token_bar_fallback: Option<String>,
    /// Whether a luck roll is added to the base passive perception.
    pub enable_luck_roll: bool,
    /// Die notation for the luck roll, when enabled.
    pub luck_roll_die: Option<DieRoll>,
    /// Whether the detection aura is rendered at all.
    pub show_detection_aura: bool,
    /// Master enable for this trap's passive detection (default `true`).
    pub passive_enabled: bool,
    /// Persistent flag: has this trap been spotted by anyone, ever.
    pub detected: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            passive_spot_dc: None,
            passive_max_range: None,
            passive_notice_player: None,
            passive_notice_gm: None,
            pp_token_bar_fallback: None,
            enable_luck_roll: false,
            luck_roll_die: None,
            show_detection_aura: false,
            passive_enabled: true,
            detected: false,
        }
    }
}

/// A trap's full configuration, decoded from a map object's notes (§3).
///
/// All fields are optional unless otherwise noted in the field docs; missing
/// values fall back to the defaults documented on each field.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapConfig {
    /// Standard vs. interaction behavior.
    pub trap_type: TrapType,
    /// Remaining uses. Absent is treated as `0` (disarmed).
    pub current_uses: Option<u32>,
    /// Maximum uses.
    pub max_uses: Option<u32>,
    /// Whether the trap is armed. Absent is treated as `false`.
    pub is_armed: Option<bool>,
    /// Primary action string, run on trigger (standard) or on auto/trigger (interaction).
    pub primary_macro: Option<String>,
    /// Ordered option action strings (standard type only).
    pub options: Vec<String>,
    /// Action string run on a successful check (interaction type).
    pub success_macro: Option<String>,
    /// Action string run on a failed check (interaction type).
    pub failure_macro: Option<String>,
    /// Ordered skill checks (0–2 entries in practice).
    pub checks: Vec<CheckSpec>,
    /// Whether C5 considers this trap for interaction-type movement triggers. Default `true`.
    pub movement_trigger: bool,
    /// If `true` and a primary is present, C5 runs it without a GM prompt.
    pub auto_trigger: bool,
    /// Which grid cell a locked token snaps to.
    pub position: PositionMode,
    /// Detection half of the config, present only if passive detection is configured.
    pub detection: Option<DetectionConfig>,
}

impl Default for TrapConfig {
    /// `movement_trigger` defaults to `true` per §3; every other field
    /// defaults to absent/empty/false.
    fn default() -> Self {
        Self {
            trap_type: TrapType::default(),
            current_uses: None,
            max_uses: None,
            is_armed: None,
            primary_macro: None,
            options: Vec::new(),
            success_macro: None,
            failure_macro: None,
            checks: Vec::new(),
            movement_trigger: true,
            auto_trigger: false,
            position: PositionMode::default(),
            detection: None,
        }
    }
}

impl TrapConfig {
    /// Whether the trap is armed and has at least one use remaining.
    ///
    /// Per §3: "when `currentUses = 0`, `isArmed` is treated as false for
    /// triggering."
    #[must_use]
    pub fn is_effectively_armed(&self) -> bool {
        self.is_armed.unwrap_or(false) && self.current_uses.unwrap_or(0) > 0
    }

    /// Whether this is an interaction-type trap.
    #[must_use]
    pub const fn is_interaction(&self) -> bool {
        matches!(self.trap_type, TrapType::Interaction)
    }

    /// Whether running the primary macro (with no checks, no success/failure
    /// macro) fully resolves the trap in one step — the "primary-only"
    /// interaction edge case from §4.5(a).
    #[must_use]
    pub fn is_primary_only_interaction(&self) -> bool {
        self.is_interaction()
            && self.success_macro.is_none()
            && self.failure_macro.is_none()
            && self.checks.is_empty()
    }
}
