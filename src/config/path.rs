//! Location of the settings database.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PssError, Result};

/// Environment variable that overrides the database location.
pub const DB_ENV_VAR: &str = "PSS_DB";

/// Default settings database path: `<data_dir>/pss/settings.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().ok_or_else(|| {
        PssError::Storage("Could not determine data directory".to_string())
    })?;
    Ok(base.join("pss").join("settings.db"))
}

/// Resolve the database path from an explicit flag or the default.
///
/// `~` and `~/...` are expanded to the home directory.
pub fn resolve_db_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let Some(path) = explicit else {
        return default_db_path();
    };

    let text = path.to_string_lossy();
    if text == "~" || text.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| {
            PssError::Storage("Could not determine home directory".to_string())
        })?;
        let rest = text.strip_prefix("~/").unwrap_or("");
        let resolved = if rest.is_empty() { home } else { home.join(rest) };
        debug!(
            original = %path.display(),
            resolved = %resolved.display(),
            "Expanded home directory path"
        );
        return Ok(resolved);
    }

    Ok(path.to_path_buf())
}
