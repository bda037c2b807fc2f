// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `HostEffect`: what a dispatcher entry point produced, for the caller and
//! for test assertions. Chat sends and whispers themselves are pushed
//! directly to the `HostPort`; this is the higher-level summary §4.9 asks for.

use trap_domain::{CharacterId, ObserverKey, TokenId, TrapId};

/// A single observable outcome of handling one host event.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEffect {
    /// A standard-type trap's GM Control Panel was shown.
    ControlPanelShown {
        /// The trap that was triggered.
        trap_id: TrapId,
        /// The token now locked to it.
        token_id: TokenId,
    },
    /// An interaction-type trap's pre-primary Interaction Menu was shown.
    InteractionMenuShown {
        /// The trap that was triggered.
        trap_id: TrapId,
        /// The token now locked to it.
        token_id: TokenId,
    },
    /// An interaction-type trap's post-primary GM Response menu was shown.
    GmResponseMenuShown {
        /// The trap awaiting a skill-check roll.
        trap_id: TrapId,
    },
    /// A skill-check dialogue now awaits a second roll (two-step advantage/disadvantage).
    AwaitingSecondRoll {
        /// The character whose check is pending.
        character_id: CharacterId,
    },
    /// A skill check resolved, successfully or not.
    CheckResolved {
        /// The trap the check belonged to.
        trap_id: TrapId,
        /// Whether the roll met or beat the DC.
        success: bool,
    },
    /// A skill mismatch arbitration menu was shown (error category 6 — the
    /// one case not recovered locally).
    MismatchArbitrationShown {
        /// The character whose roll mismatched.
        character_id: CharacterId,
    },
    /// A lock was released.
    LockReleased {
        /// The token freed.
        token_id: TokenId,
        /// Whether a use was committed/consumed on release.
        committed: bool,
    },
    /// A passive-perception spot notice fired.
    PassiveSpotFired {
        /// The trap that was spotted.
        trap_id: TrapId,
        /// The observer that spotted it.
        observer: ObserverKey,
    },
    /// A GM-visible warning was enqueued for a recovered (category 1–5) error.
    Warned {
        /// Human-readable warning body.
        message: String,
    },
}
