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
#![doc = r"Core data model for the trap & interaction engine.

Defines the types that `trap-notes-codec`, `trap-visual`, and `trap-engine`
all share: trap configuration, lock records, pending checks, the passive
notice ledger, global toggles, and host-object identifiers. This crate has
no host dependency and no I/O; it is pure data plus the small derived
predicates documented on each type.
"]

/// Die notation parsing (`NdM`).
pub mod die;
/// Pending Check: in-flight skill-check dialogues.
pub mod dialogue;
/// Host-object and actor identifiers.
pub mod ids;
/// Passive Notice Ledger.
pub mod ledger;
/// Lock Record.
pub mod lock;
/// Global toggles.
pub mod toggles;
/// Trap Config.
pub mod trap_config;

pub use die::{parse_die_notation, DieParseError, DieRoll};
pub use dialogue::{AdvantageMode, CheckRef, PendingCheck};
pub use ids::{CharacterId, PageId, PlayerId, TokenId, TrapId};
pub use ledger::{ObserverKey, PassiveLedger, PassiveMessage};
pub use lock::LockRecord;
pub use toggles::GlobalToggles;
pub use trap_config::{CheckSpec, DetectionConfig, PositionMode, TrapConfig, TrapType};
