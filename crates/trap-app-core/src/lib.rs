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
#![doc = r"Shared application services for trap engine host adapters (config,
GM-notice batching). Keeps host-integration layers thin and free of storage
or delivery-dedupe logic of their own."]

pub mod config;
pub mod notice;

pub use config::{ConfigError, ConfigService, ConfigStore};
pub use notice::{Notice, NoticeQueue};
