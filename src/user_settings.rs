use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ContractAddresses, DEFAULT_POLL_INTERVAL_MS, MINIMUM_ICX_AMOUNT_IN_WALLET};

const SETTINGS_FILE: &str = "balanced_settings.json";

fn default_selected_nid() -> u64 {
    1 // Mainnet
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_icx_reserve() -> Decimal {
    MINIMUM_ICX_AMOUNT_IN_WALLET
}

/// User settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Selected network id
    #[serde(default = "default_selected_nid")]
    pub selected_nid: u64,
    /// Custom RPC overrides per nid
    #[serde(default)]
    pub custom_rpcs: HashMap<u64, String>,
    /// Contract addresses for networks without built-in ones
    #[serde(default)]
    pub custom_contracts: HashMap<u64, ContractAddresses>,
    /// Delay between transaction status polls (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// ICX never offered by "max" buttons
    #[serde(default = "default_icx_reserve", with = "rust_decimal::serde::str")]
    pub icx_reserve: Decimal,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_nid: default_selected_nid(),
            custom_rpcs: HashMap::new(),
            custom_contracts: HashMap::new(),
            poll_interval_ms: default_poll_interval(),
            icx_reserve: default_icx_reserve(),
        }
    }
}

impl UserSettings {
    /// Get the settings file path
    fn settings_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            let app_dir = config_dir.join("balanced-wallet");
            if !app_dir.exists() {
                let _ = fs::create_dir_all(&app_dir);
            }
            app_dir.join(SETTINGS_FILE)
        } else {
            PathBuf::from(SETTINGS_FILE)
        }
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Get custom RPC for a network, or None if using default
    pub fn get_custom_rpc(&self, nid: u64) -> Option<&String> {
        self.custom_rpcs.get(&nid).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a network (empty string removes the override)
    pub fn set_custom_rpc(&mut self, nid: u64, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(&nid);
        } else {
            self.custom_rpcs.insert(nid, rpc.trim().to_string());
        }
    }
}
