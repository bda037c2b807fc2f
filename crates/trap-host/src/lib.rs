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
#![doc = r"Host object API port (§6) and an in-memory mock adapter.

`HostPort` is the trait boundary between the engine crates and the map
platform. The platform itself is out of scope; this crate ships only the
contract and a `MockHost` used by every other crate's test suite and by the
CLI harness.
"]

/// `HostError`.
pub mod error;
/// In-memory `HostPort` implementation for tests and demos.
pub mod mock;
/// The `HostPort` trait.
pub mod port;
/// Plain-data value types mirroring the host's object model.
pub mod types;

pub use error::HostError;
pub use mock::MockHost;
pub use port::{parse_controlled_by, HostPort};
