use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// User preferences, stored as `prefs.toml` in the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  /// One of `date-desc`, `date-asc`, `company-asc`, `company-desc`.
  pub default_sort: Option<String>,
  pub display_mode: Option<String>,
  /// Directory that site-local paths such as `/audio/mix.mp3` resolve against.
  pub asset_root: Option<PathBuf>,
}

impl Config {
  fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "folio")
  }

  pub fn load() -> Self {
    if let Some(proj_dirs) = Self::project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(&config_file) {
        match Self::from_toml(&content) {
          Some(config) => return config,
          None => warn!(path = %config_file.display(), "config: ignoring unreadable prefs"),
        }
      }
    }
    Self::default()
  }

  pub fn from_toml(content: &str) -> Option<Self> {
    toml::from_str(content).ok()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = Self::project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Where the rolling log files go.
  pub fn log_dir() -> PathBuf {
    Self::project_dirs().map_or_else(|| std::env::temp_dir().join("folio"), |d| d.cache_dir().to_path_buf())
  }
}
