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
#![doc = r"Filesystem-backed `ConfigStore` for the trap engine: stores global
toggles and the lock-registry boot-recovery snapshot as JSON files under the
platform config directory."]

use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use trap_app_core::{ConfigError, ConfigStore};

/// Stores configs as JSON files under the platform config directory
/// (e.g. `~/.config/trap-engine` on Linux).
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Creates a store rooted at the user config directory.
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "trap-engine")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir().to_path_buf())
    }

    /// Creates a store rooted at an explicit directory, for tests and demos
    /// that should not touch the real platform config dir.
    pub fn at(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_for(key);
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reports_not_found() {
        let dir = std::env::temp_dir().join(format!("trap-config-fs-test-{}", std::process::id()));
        let store = FsConfigStore::at(dir.clone()).expect("creates dir");
        assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("trap-config-fs-test-rt-{}", std::process::id()));
        let store = FsConfigStore::at(dir.clone()).expect("creates dir");
        store.save_raw("toggles", b"{\"triggers_enabled\":true}").expect("saves");
        let loaded = store.load_raw("toggles").expect("loads");
        assert_eq!(loaded, b"{\"triggers_enabled\":true}");
        let _ = fs::remove_dir_all(dir);
    }
}
