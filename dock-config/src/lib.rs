//! Configuration for the dock container manager.
//!
//! Configuration is read from YAML. [`discover`] looks at `$DOCK_CONFIG`, then
//! `/etc/dock/manager.yaml`, and falls back to defaults.

pub mod config;


use std::fs;
use std::path::{Path, PathBuf};

use dock_core::{DockError, Result};
use tracing::debug;

pub use config::{
    AnsibleSettings, BootSettings, EngineSettings, InitializerKind, ManagerConfig, PortSettings,
    ReleasePolicy,
};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "DOCK_CONFIG";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/dock/manager.yaml";

/// Loads, expands and validates the configuration at `path`.
pub fn load(path: &Path) -> Result<ManagerConfig> {
    debug!("Loading manager configuration from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| DockError::io(path, e))?;
    let mut config = ManagerConfig::from_yaml_str(&content)
        .map_err(|e| DockError::Config(format!("{}: {}", path.display(), e)))?;
    config.expand_paths();
    config.validate()?;
    Ok(config)
}

/// Locates the configuration file to use, if any.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV) {
        if !explicit.is_empty() {
            return Some(PathBuf::from(shellexpand::tilde(&explicit).into_owned()));
        }
    }
    let system = PathBuf::from(SYSTEM_CONFIG_PATH);
    system.exists().then_some(system)
}

/// Loads the discovered configuration, or defaults when there is none.
///
/// A `$DOCK_CONFIG` pointing at a missing file is an error.
pub fn discover() -> Result<ManagerConfig> {
    match config_path() {
        Some(path) => load(&path),
        None => {
            debug!("No manager configuration found, using defaults");
            let mut config = ManagerConfig::default();
            config.expand_paths();
            config.validate()?;
            Ok(config)
        }
    }
}
