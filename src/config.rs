use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::db::Database;

/// Runtime settings: `config.json` in the config dir, then `JOBBOARD_*`
/// environment variables, then command-line flags.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// SQLite file holding listings, applications and bookmarks.
    pub database: Option<PathBuf>,
    /// Hosted data API returning a JSON array of listings.
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    /// Acting user for apply/bookmark/dashboard when `--user` is omitted.
    pub user: Option<String>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let mut settings = match Self::default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jobboard").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads settings from `path`; a missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Overrides fields from the environment. `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(db) = non_empty("JOBBOARD_DB") {
            self.database = Some(PathBuf::from(db));
        }
        if let Some(url) = non_empty("JOBBOARD_API_URL") {
            self.api_url = Some(url);
        }
        if let Some(key) = non_empty("JOBBOARD_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(user) = non_empty("JOBBOARD_USER") {
            self.user = Some(user);
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(Database::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::from_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"database": "/tmp/board.db", "api_url": "https://api.example/listings", "user": "amina"}"#,
        )
        .unwrap();

        let mut settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/board.db"));

        let env: HashMap<&str, &str> = [("JOBBOARD_USER", "baraka"), ("JOBBOARD_API_KEY", "  ")].into();
        settings.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.user.as_deref(), Some("baraka"));
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.api_url.as_deref(), Some("https://api.example/listings"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "database = nope").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
