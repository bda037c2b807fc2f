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
#![doc = r"Free-form note-block codec for trap configuration (§4).

Reads and writes the `{!traptrigger ...}` and `{!trapdetection ...}` bracketed
blocks that carry a trap's configuration inside a map object's notes field,
preserving any other text in the field untouched.
"]

mod bools;
/// Detection-block decode/encode.
pub mod detection;
/// HTML entity escaping for note values.
pub mod entities;
/// `NotesCodecError`.
pub mod error;
/// Top-level block location and orchestration.
pub mod notes;
/// Bracket-block extraction and `key:[value]` pair parsing.
pub mod parser;
/// Trigger-block decode/encode.
pub mod trigger;

pub use error::NotesCodecError;
pub use notes::{decode_notes, encode_notes};
