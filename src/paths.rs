//! Platform-appropriate locations for the config file and logs.
//!
//! In development mode (cargo run) everything lives in the working directory.
//! Installed builds use:
//! - Windows: `%APPDATA%\Pagemark\`
//! - macOS: `~/Library/Application Support/Pagemark/`
//! - Linux: `~/.config/pagemark/` (config), `~/.local/share/pagemark/` (logs)

use std::path::PathBuf;

/// Returns true when running in development mode (cargo run or a debug build).
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

pub fn config_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    #[cfg(target_os = "linux")]
    {
        dirs::config_dir().map(|p| p.join("pagemark"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        data_dir()
    }
}

pub fn data_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    #[cfg(target_os = "linux")]
    {
        dirs::data_dir().map(|p| p.join("pagemark"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        dirs::data_dir().map(|p| p.join("Pagemark"))
    }
}

/// `./config.json` in dev mode, `{config_dir}/config.json` otherwise.
pub fn config_file() -> PathBuf {
    config_dir()
        .map(|p| p.join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

pub fn logs_dir() -> PathBuf {
    data_dir()
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Create the config and log directories of an installed build.
pub fn ensure_directories() -> std::io::Result<()> {
    if is_dev_mode() {
        return Ok(());
    }

    if let Some(config) = config_dir() {
        std::fs::create_dir_all(&config)?;
    }
    std::fs::create_dir_all(logs_dir())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_has_json_extension() {
        assert!(config_file().to_string_lossy().ends_with("config.json"));
    }

    #[test]
    fn test_dev_mode_uses_working_directory() {
        // Tests build with debug assertions
        assert!(is_dev_mode());
        assert_eq!(config_dir(), Some(PathBuf::from(".")));
        assert_eq!(logs_dir(), PathBuf::from("./logs"));
    }
}
