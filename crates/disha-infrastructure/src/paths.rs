//! Unified path management for Disha's persisted client state.
//!
//! All durable state lives in one directory, `~/.config/disha/` by
//! default. Tests and embedders can point the store at any other root.

use std::path::PathBuf;

use disha_core::error::{DishaError, Result};

const APP_DIR: &str = "disha";
const STATE_FILE: &str = "state.toml";

/// Resolves where Disha keeps its persisted state.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/disha/
/// └── state.toml    # session, remembered emails, theme
/// ```
#[derive(Debug, Clone)]
pub struct DishaPaths {
    root: PathBuf,
}

impl DishaPaths {
    /// Uses the platform config directory (`~/.config/disha/` on
    /// Linux/macOS).
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DishaError::config("Cannot find config directory"))?;
        Ok(Self {
            root: config_dir.join(APP_DIR),
        })
    }

    /// Uses an explicit root instead of the platform default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Path of the single state file.
    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_file_lives_under_the_root() {
        let paths = DishaPaths::with_root("/tmp/disha-test");
        assert_eq!(
            paths.state_file(),
            PathBuf::from("/tmp/disha-test/state.toml")
        );
    }
}
