//! Settings and seller profile.
//!
//! `settings.toml` lives in the platform config directory and only records
//! where the data root is. The data root holds everything else:
//!
//! ```text
//! <data_root>/
//! ├── seller.toml   seller info, IBAN, default validity
//! ├── assets/       DejaVuSans.ttf, DejaVuSans-Bold.ttf, logo.png (all optional)
//! └── quotes/       generated PDFs
//! ```

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

const DEFAULT_SELLER_TEMPLATE: &str = include_str!("../seller.toml");
pub const DEFAULT_DATA_ROOT: &str = "~/Documents/Quotes";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub data_root: String,
}

impl AppSettings {
    pub fn root(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root().join("assets")
    }

    pub fn quotes_dir(&self) -> PathBuf {
        self.root().join("quotes")
    }

    /// Creates the data root folders if they are missing.
    pub fn ensure_layout(&self) -> Result<(), ConfigError> {
        for dir in [self.assets_dir(), self.quotes_dir()] {
            fs::create_dir_all(&dir).map_err(|source| ConfigError::Io { path: dir, source })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerConfig {
    pub info: String,
    pub iban: String,
    #[serde(default = "default_validity_days")]
    pub validity_days: i64,
}

fn default_validity_days() -> i64 {
    30
}

pub fn settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "quote-maker", "app") {
        return proj_dirs.config_dir().join("settings.toml");
    }
    PathBuf::from("settings.toml")
}

/// Reads `settings.toml`; `Ok(None)` when it has never been written.
pub fn load_settings(path: &Path) -> Result<Option<AppSettings>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    fs::write(path, toml_str).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `<root>/seller.toml`, writing the default profile on first use.
pub fn load_seller_config(root: &Path) -> Result<SellerConfig, ConfigError> {
    let path = root.join("seller.toml");
    let content = if path.exists() {
        fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?
    } else {
        info!(path = %path.display(), "Initializing default seller profile");
        fs::create_dir_all(root).map_err(|source| ConfigError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        fs::write(&path, DEFAULT_SELLER_TEMPLATE).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        DEFAULT_SELLER_TEMPLATE.to_string()
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seller_profile_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let seller = load_seller_config(dir.path()).unwrap();

        assert!(seller.info.contains("My Company Srl"));
        assert_eq!(seller.validity_days, 30);
        assert!(dir.path().join("seller.toml").exists());

        fs::write(
            dir.path().join("seller.toml"),
            "info = \"Other Co\"\niban = \"IT60X0542811101000000123456\"\n",
        )
        .unwrap();
        let edited = load_seller_config(dir.path()).unwrap();
        assert_eq!(edited.info, "Other Co");
        assert_eq!(edited.validity_days, 30);
    }

    #[test]
    fn broken_seller_profile_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("seller.toml"), "info = ").unwrap();
        assert!(matches!(
            load_seller_config(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        assert!(load_settings(&path).unwrap().is_none());

        let settings = AppSettings {
            data_root: dir.path().join("data").to_string_lossy().to_string(),
        };
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap().unwrap();
        assert_eq!(loaded.data_root, settings.data_root);

        loaded.ensure_layout().unwrap();
        assert!(loaded.quotes_dir().is_dir());
        assert!(loaded.assets_dir().is_dir());
    }

    #[test]
    fn plain_paths_are_not_expanded() {
        assert_eq!(expand_home_dir("/srv/quotes"), "/srv/quotes");
    }
}
