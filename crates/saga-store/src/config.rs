//! Store configuration
//!
//! Configuration loaded from `.saga-store.toml`.

use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf};

const CONFIG_FILE: &str = ".saga-store.toml";

/// Store configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Name used to tell stores apart in log output
    #[serde(default = "default_name")]
    pub name: String,

    /// Log every committed action at debug level
    #[serde(default = "default_log_actions")]
    pub log_actions: bool,

    /// Also trace the full state after every commit (noisy)
    #[serde(default)]
    pub log_state: bool,
}

fn default_name() -> String {
    "main".to_string()
}

fn default_log_actions() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_actions: default_log_actions(),
            log_state: false,
        }
    }
}

impl StoreConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load config from CWD first, then home directory, or use defaults
    pub fn load() -> Self {
        if let Some(content) = load_config_file() {
            match Self::from_toml_str(&content) {
                Ok(config) => {
                    log::info!("Loaded store config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default store config");
        Self::default()
    }
}

/// Read the config file from the working directory, falling back to `$HOME`
fn load_config_file() -> Option<String> {
    if let Ok(content) = std::fs::read_to_string(CONFIG_FILE) {
        log::debug!("Loaded config from {}", CONFIG_FILE);
        return Some(content);
    }

    let home_config = env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))?;
    match std::fs::read_to_string(&home_config) {
        Ok(content) => {
            log::debug!("Loaded config from {}", home_config.display());
            Some(content)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "main");
        assert!(config.log_actions);
        assert!(!config.log_state);
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            name = "my app"
            log_state = true
        "#;
        let config = StoreConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.name, "my app");
        assert!(config.log_state);
        // log_actions should use default
        assert!(config.log_actions);
    }

    #[test]
    fn test_config_rejects_wrong_types() {
        assert!(StoreConfig::from_toml_str("log_actions = \"yes\"").is_err());
    }

    #[test]
    fn test_named() {
        assert_eq!(StoreConfig::named("admin").name, "admin");
    }
}
