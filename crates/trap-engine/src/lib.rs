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
#![doc = r"Runtime behavior for the trap & interaction engine.

Everything here is pure state transition over `trap-domain` types and a
`trap-host::HostPort`: the lock registry, the movement trigger engine, the
skill-check dialogue state, the action runner, the passive sensor, and the
event dispatcher that ties all of them to one host event or chat command at a
time. No module here talks to a live host directly outside of the `HostPort`
trait, so the whole crate runs the same way against `trap-host::MockHost` in
tests as it does against a real adapter.
"]

/// Action Runner: executes a trap's configured macro/command/template/chat action.
pub mod action;
/// Dialogue State: pending skill-check dialogues and roll resolution.
pub mod dialogue;
/// Event Dispatcher: routes host events and chat commands to every other module.
pub mod dispatch;
/// `HostEffect`: the observable outcome of handling one event.
pub mod effect;
/// `EngineError`: the six error-taxonomy categories.
pub mod error;
/// Lock Registry: token locks, free-move grants, and locked-token reprojection.
pub mod lock;
/// Passive Sensor: passive-perception spot checks on a door/path open transition.
pub mod passive;
/// Trigger Engine: movement-driven trap activation.
pub mod trigger;

pub use action::{classify, run_action, ActionContext, ActionKind};
pub use dialogue::{PendingCheckStore, RollOutcome, RollPayload};
pub use dispatch::command::{parse_command, Command, CommandParseError, MarkTriggeredTarget};
pub use dispatch::EngineState;
pub use effect::HostEffect;
pub use error::EngineError;
pub use lock::LockRegistry;
pub use passive::PassiveSettings;
