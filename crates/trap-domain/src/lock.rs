// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lock Record: immobility state for a token engaged with a trap (§3, §4.4).

use crate::ids::TrapId;
use crate::trap_config::TrapConfig;
use trap_geom::Vec2;

/// State preventing a token from moving while engaged with a trap.
#[derive(Debug, Clone, PartialEq)]
pub struct LockRecord {
    /// The trap whose detection created this lock.
    pub trap_id: TrapId,
    /// Position in the trap's local (unrotated) frame at lock time.
    pub relative_offset: Vec2,
    /// Set once an action has run that commits to consuming a use.
    pub macro_triggered: bool,
    /// The trap config observed at lock time, for safe use-depletion on release.
    pub trap_data_snapshot: TrapConfig,
}

impl LockRecord {
    /// Builds a new, not-yet-triggered lock record.
    #[must_use]
    pub const fn new(trap_id: TrapId, relative_offset: Vec2, trap_data_snapshot: TrapConfig) -> Self {
        Self {
            trap_id,
            relative_offset,
            macro_triggered: false,
            trap_data_snapshot,
        }
    }
}
