use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::Notice;
use crate::constants::HISTORY_CAPACITY;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Application configuration persisted to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Base URL of the extraction backend
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Paper reopened on startup
    #[serde(default)]
    pub last_paper: Option<String>,

    /// Undo depth
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_history_capacity() -> usize {
    HISTORY_CAPACITY
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            last_paper: None,
            history_capacity: default_history_capacity(),
        }
    }
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    pub data: AppConfigData,
    pub config_path: PathBuf,
    /// Whether config needs to be saved
    pub dirty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: crate::paths::config_file(),
            dirty: false,
        }
    }
}

/// Message to trigger config save
#[derive(Message)]
pub struct SaveConfigRequest;

/// Message to change the backend URL
#[derive(Message)]
pub struct SetServerUrlRequest {
    pub url: String,
}

/// Message to remember the paper being edited
#[derive(Message)]
pub struct UpdateLastPaperRequest {
    pub filename: String,
}

/// Read the config file. The error string explains why defaults were used.
fn load_config(path: &Path) -> (AppConfigData, Option<String>) {
    if !path.exists() {
        info!("No config file found, using defaults");
        return (AppConfigData::default(), None);
    }

    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(data) => {
                info!("Loaded config from {:?}", path);
                (data, None)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                (
                    AppConfigData::default(),
                    Some(format!("Configuration file was corrupted: {}", e)),
                )
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            (
                AppConfigData::default(),
                Some(format!("Could not read configuration file: {}", e)),
            )
        }
    }
}

fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(mut config: ResMut<AppConfig>, mut notices: MessageWriter<Notice>) {
    let (data, reset_reason) = load_config(&config.config_path);
    config.data = data;
    config.dirty = false;

    if let Some(reason) = reset_reason {
        notices.write(Notice::warning(format!("{}. Defaults restored.", reason)));
    }
}

fn save_config_system(
    mut events: MessageReader<SaveConfigRequest>,
    mut config: ResMut<AppConfig>,
) {
    for _ in events.read() {
        if config.dirty {
            save_config(&config);
            config.dirty = false;
        }
    }
}

fn set_server_url_system(
    mut events: MessageReader<SetServerUrlRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        let url = event.url.trim().trim_end_matches('/');
        if url.is_empty() || url == config.data.server_url {
            continue;
        }
        config.data.server_url = url.to_string();
        config.dirty = true;
        save_events.write(SaveConfigRequest);
        info!("Server URL set to {}", url);
    }
}

fn update_last_paper_system(
    mut events: MessageReader<UpdateLastPaperRequest>,
    mut config: ResMut<AppConfig>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) {
    for event in events.read() {
        if config.data.last_paper.as_deref() == Some(event.filename.as_str()) {
            continue;
        }
        config.data.last_paper = Some(event.filename.clone());
        config.dirty = true;
        save_events.write(SaveConfigRequest);
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .add_message::<Notice>()
            .add_message::<SaveConfigRequest>()
            .add_message::<SetServerUrlRequest>()
            .add_message::<UpdateLastPaperRequest>()
            .add_systems(Startup, load_config_system.in_set(ConfigLoaded))
            .add_systems(
                Update,
                (
                    set_server_url_system.run_if(on_message::<SetServerUrlRequest>),
                    update_last_paper_system.run_if(on_message::<UpdateLastPaperRequest>),
                    save_config_system.run_if(on_message::<SaveConfigRequest>),
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_data_default() {
        let data = AppConfigData::default();
        assert_eq!(data.server_url, "http://localhost:8000");
        assert!(data.last_paper.is_none());
        assert_eq!(data.history_capacity, 30);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let data: AppConfigData = serde_json::from_str(r#"{"last_paper": "a.pdf"}"#).unwrap();
        assert_eq!(data.server_url, DEFAULT_SERVER_URL);
        assert_eq!(data.last_paper.as_deref(), Some("a.pdf"));
        assert_eq!(data.history_capacity, HISTORY_CAPACITY);
    }

    #[test]
    fn test_corrupt_file_falls_back_with_reason() {
        let path = std::env::temp_dir().join(format!("pagemark-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();

        let (data, reason) = load_config(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(data, AppConfigData::default());
        assert!(reason.unwrap().starts_with("Configuration file was corrupted"));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("pagemark-config-does-not-exist.json");
        let (data, reason) = load_config(&path);
        assert_eq!(data, AppConfigData::default());
        assert!(reason.is_none());
    }
}
