use std::path::PathBuf;

use igame_common::PlatformError;

pub(super) const APP_NAME: &str = "igame";

/// Returns the platform-specific configuration directory.
///
/// - macOS: `~/Library/Application Support/igame`
/// - Linux: `$XDG_CONFIG_HOME/igame` (defaults to `~/.config/igame`)
/// - Windows: `%APPDATA%\igame`
pub fn config_dir() -> Result<PathBuf, PlatformError> {
    Ok(dirs::config_dir()
        .ok_or_else(|| PlatformError::PathError("could not determine config directory".into()))?
        .join(APP_NAME))
}

/// Returns the platform-specific data directory.
///
/// - macOS: `~/Library/Application Support/igame`
/// - Linux: `$XDG_DATA_HOME/igame` (defaults to `~/.local/share/igame`)
/// - Windows: `%APPDATA%\igame`
pub fn data_dir() -> Result<PathBuf, PlatformError> {
    Ok(dirs::data_dir()
        .ok_or_else(|| PlatformError::PathError("could not determine data directory".into()))?
        .join(APP_NAME))
}

/// Returns the path to the client-side storage file.
///
/// Located at `data_dir()/storage.json`.
pub fn storage_file() -> Result<PathBuf, PlatformError> {
    Ok(data_dir()?.join("storage.json"))
}
