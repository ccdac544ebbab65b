//! Player configuration for padqueue
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/padqueue/config.yaml

use anyhow::{Context, Result};
use padqueue_core::{SyncPolicy, WindowSource, DEFAULT_API_BASE, WINDOW_CAPACITY};
use padqueue_midi::GridConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Remote service settings
    pub spotify: SpotifyConfig,
    /// Queue polling bounds
    pub sync: SyncPolicy,
    /// Grid controller settings
    pub grid: GridConfig,
}

/// Spotify section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Web API root (override for proxies/tests)
    pub api_base: String,
    /// Playlist mapped onto the grid
    pub playlist_id: String,
    /// Name of the output device to bind
    pub device_name: String,
    /// Tracks fetched per window (at most 64)
    pub window_limit: usize,
    /// Playlist position of the first grid cell
    pub window_offset: usize,
    /// Environment variable holding the OAuth access token
    pub token_env: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            playlist_id: "3SNkas6dOc7sA4bTD5zR6q".to_string(),
            device_name: "Spotifyd@raspberrypi".to_string(),
            window_limit: WINDOW_CAPACITY,
            window_offset: 0,
            token_env: "SPOTIFY_ACCESS_TOKEN".to_string(),
        }
    }
}

impl SpotifyConfig {
    pub fn window_source(&self) -> WindowSource {
        WindowSource::new(&self.playlist_id, self.window_limit, self.window_offset)
    }

    /// Read the access token from the configured environment variable
    pub fn read_token(&self) -> Result<String> {
        let token = std::env::var(&self.token_env)
            .with_context(|| format!("Environment variable {} must hold a Spotify access token", self.token_env))?;
        let token = token.trim().to_string();
        if token.is_empty() {
            anyhow::bail!("Environment variable {} is empty", self.token_env);
        }
        Ok(token)
    }
}

/// Get the default config file path
///
/// Returns: ~/.config/padqueue/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("padqueue")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> PlayerConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return PlayerConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<PlayerConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_config: Loaded config - playlist: {}, device: '{}', grid: '{}' ({:?})",
                    config.spotify.playlist_id,
                    config.spotify.device_name,
                    config.grid.port_match,
                    config.grid.layout
                );
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                PlayerConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            PlayerConfig::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories
pub fn save_config(config: &PlayerConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}
