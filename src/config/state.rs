// Application state module
// Immutable state shared by every connection task

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::error::StartupError;
use crate::logger;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical asset root, resolved once at startup
    pub asset_root: PathBuf,
}

impl AppState {
    /// Build state from configuration, validating the asset root
    ///
    /// The root must exist and be a directory. A missing index file is only
    /// a warning: `/` answers 404 until the file shows up.
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let asset_root = canonical_asset_root(&config.assets.root)?;

        if !asset_root.join(&config.assets.index_file).is_file() {
            logger::log_warning(&format!(
                "Index file '{}' not found in asset root '{}'",
                config.assets.index_file,
                asset_root.display()
            ));
        }

        Ok(Self { config, asset_root })
    }
}

fn canonical_asset_root(root: &str) -> Result<PathBuf, StartupError> {
    let canonical = Path::new(root)
        .canonicalize()
        .map_err(|e| StartupError::AssetRoot {
            path: root.to_string(),
            reason: e.to_string(),
        })?;

    if !canonical.is_dir() {
        return Err(StartupError::AssetRoot {
            path: root.to_string(),
            reason: "not a directory".to_string(),
        });
    }

    Ok(canonical)
}
