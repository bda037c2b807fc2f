// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors surfaced by `HostPort` operations.

use thiserror::Error;

/// Failure talking to the host object graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// A referenced id does not resolve to an object of the expected type.
    #[error("host object not found: {0}")]
    ObjectMissing(String),
    /// The area-trigger collaborator is not available.
    #[error("area-trigger collaborator unavailable")]
    AreaTriggerUnavailable,
}
