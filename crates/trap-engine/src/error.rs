// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `EngineError`: the six error-taxonomy categories from §7, as real types.

use thiserror::Error;

/// A failure inside the engine. Categories 1–5 are recovered locally by every
/// caller (logged and absorbed into a GM notice); category 6 is the one case
/// that surfaces to the caller as a [`crate::effect::HostEffect`] instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Notes could not be decoded or violated a trap invariant.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// A referenced host object id does not resolve.
    #[error("host object missing: {0}")]
    HostObjectMissing(String),
    /// A roll arrived from a user who does not control the pending check's character.
    #[error("authorization denied for {who}")]
    AuthorizationDenied {
        /// The player or token that attempted the action.
        who: String,
    },
    /// An action string referenced an unknown macro, malformed template, or
    /// unavailable collaborator.
    #[error("action execution failed: {0}")]
    ActionExecutionFailure(String),
    /// Passive perception could not be derived for an (observer, trap) pair.
    #[error("sheet lookup failed: {0}")]
    SheetLookupFailure(String),
    /// The incoming roll's skill disagrees with the pending check's expected skill.
    #[error("skill mismatch: expected {expected}, rolled {rolled}")]
    Mismatch {
        /// The expected (normalized) skill name.
        expected: String,
        /// The rolled (normalized) skill name.
        rolled: String,
    },
}
