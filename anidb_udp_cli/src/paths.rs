//! Configuration file location

use std::path::PathBuf;

/// Directory name used under the platform config directory
const APP_DIR: &str = "anidb-udp";

/// Name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Returns the configuration directory
///
/// `$XDG_CONFIG_HOME/anidb-udp` when set (outside Windows), otherwise the
/// platform config directory from `dirs`. Falls back to `.anidb-udp` in the
/// working directory.
pub fn get_config_dir() -> PathBuf {
    #[cfg(not(target_os = "windows"))]
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join(APP_DIR);
    }

    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".anidb-udp"))
}

/// Returns the path to the configuration file
pub fn get_config_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILE)
}
