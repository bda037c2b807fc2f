// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `ConfigParseError` (error taxonomy item 1 in §7).

use thiserror::Error;

/// Failure decoding or validating a trap's note blocks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotesCodecError {
    /// A `key:[value]` entry could not be parsed out of its block.
    #[error("malformed note block entry: {0}")]
    MalformedEntry(String),
    /// A field expecting an integer held something else.
    #[error("invalid integer for `{key}`: {value}")]
    InvalidInteger {
        /// The offending key.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },
    /// A field expecting a boolean held something else.
    #[error("invalid boolean for `{key}`: {value}")]
    InvalidBoolean {
        /// The offending key.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },
    /// A decoded config violated a documented invariant (e.g. `current_uses > max_uses`).
    #[error("trap config invariant violated: {0}")]
    InvariantViolation(String),
}
