use std::path::PathBuf;

const APP_DIR: &str = "InApp";

/// Base directory for InApp data files
fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR))
}

/// Base directory for InApp config files
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// Path to the log file written by the driver
pub fn log_file_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("inapp.log"))
}

/// Path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// Creates the data directory if needed and returns it
pub fn ensure_data_dir() -> Option<PathBuf> {
    data_dir().and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        Some(dir)
    })
}
