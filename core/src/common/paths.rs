//! Path Utilities
//!
//! Resolution of the server's home directory (`~/.gworkspace-mcp/`) and the
//! well-known files inside it.

use std::path::{Path, PathBuf};

const HOME_DIR_NAME: &str = ".gworkspace-mcp";

/// Get the default base directory (`~/.gworkspace-mcp/`)
pub fn default_home_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(HOME_DIR_NAME))
}

/// Path of the optional JSON config file inside `home`
pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.json")
}

/// Default directory holding the client secret and the encrypted token
pub fn default_credentials_dir(home: &Path) -> PathBuf {
    home.join("credentials")
}
