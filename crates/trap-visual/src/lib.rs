// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    rust_2018_idioms,
    missing_docs,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![doc = r"Derives aura colors/radii and token-bar values from trap state (§4.3).

Pure functions from `(&TrapConfig, &GlobalToggles)` to `VisualState`; no host
calls. The dispatcher is responsible for pushing a derived `VisualState` to
the host's aura/bar properties.
"]

use trap_domain::{GlobalToggles, TrapConfig};

/// Color state of aura 1 (trigger/armed state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAuraColor {
    /// Armed, has uses, triggers enabled, interaction type.
    ArmedInteraction,
    /// Armed, has uses, triggers enabled, standard type.
    Armed,
    /// Armed, has uses, but triggers globally disabled.
    Paused,
    /// Not effectively armed, interaction type.
    DisarmedInteraction,
    /// Not effectively armed, standard type.
    Disarmed,
}

/// Color state of aura 2 (detection state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionAuraColor {
    /// Not yet spotted, trap effectively armed.
    Detection,
    /// Already spotted, trap effectively armed.
    Detected,
    /// Not yet spotted, trap not effectively armed.
    DisarmedUndetected,
    /// Already spotted, trap not effectively armed.
    DisarmedDetected,
    /// This trap's passive detection is disabled (`passiveEnabled = false`).
    PassiveDisabled,
    /// No detection block configured, or its aura is turned off.
    DetectionOff,
}

/// Bar 1: remaining/maximum uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsesBar {
    /// Remaining uses, defaulting to `0`.
    pub current: u32,
    /// Maximum uses, defaulting to `0`.
    pub max: u32,
}

/// Fully derived visual presentation for one trap object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    /// Aura 1 color (trigger state). Always present.
    pub trigger_aura: TriggerAuraColor,
    /// Aura 2 color (detection state). Always present, even with no detection block.
    pub detection_aura_color: DetectionAuraColor,
    /// Aura 2 radius in map units, or `None` when the aura should render empty.
    pub detection_aura_radius: Option<f64>,
    /// Bar 1: current/max uses.
    pub uses_bar: UsesBar,
    /// Bar 2: passive spot DC, if a detection block sets one.
    pub spot_dc_bar: Option<i32>,
}

/// Derives the full visual state for a trap from its config and the two
/// global toggles.
///
/// `token_outer_radius` and `now_ms` are needed to compute the detection aura
/// radius and to account for an active, possibly-expired `detectionAurasHidden`
/// timer.
#[must_use]
pub fn derive_visual_state(
    config: &TrapConfig,
    toggles: &GlobalToggles,
    token_outer_radius: f64,
    now_ms: u64,
) -> VisualState {
    let armed_with_uses = config.is_effectively_armed();
    let interaction = config.is_interaction();

    let trigger_aura = match (armed_with_uses, toggles.triggers_enabled, interaction) {
        (true, true, true) => TriggerAuraColor::ArmedInteraction,
        (true, true, false) => TriggerAuraColor::Armed,
        (true, false, _) => TriggerAuraColor::Paused,
        (false, _, true) => TriggerAuraColor::DisarmedInteraction,
        (false, _, false) => TriggerAuraColor::Disarmed,
    };

    let (detection_aura_color, detection_aura_radius) = match &config.detection {
        None => (DetectionAuraColor::DetectionOff, None),
        Some(detection) => {
            let color = if !detection.passive_enabled {
                DetectionAuraColor::PassiveDisabled
            } else if !detection.show_detection_aura {
                DetectionAuraColor::DetectionOff
            } else {
                match (detection.detected, armed_with_uses) {
                    (true, true) => DetectionAuraColor::Detected,
                    (true, false) => DetectionAuraColor::DisarmedDetected,
                    (false, true) => DetectionAuraColor::Detection,
                    (false, false) => DetectionAuraColor::DisarmedUndetected,
                }
            };

            let radius = if toggles.auras_hidden_at(now_ms) {
                None
            } else {
                detection
                    .passive_max_range
                    .map(|range| (range - token_outer_radius).max(0.0))
            };

            (color, radius)
        }
    };

    VisualState {
        trigger_aura,
        detection_aura_color,
        detection_aura_radius,
        uses_bar: UsesBar {
            current: config.current_uses.unwrap_or(0),
            max: config.max_uses.unwrap_or(0),
        },
        spot_dc_bar: config.detection.as_ref().and_then(|d| d.passive_spot_dc),
    }
}
