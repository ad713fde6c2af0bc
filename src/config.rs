use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::models::{Locale, NewSearch};

/// Values a new search starts with when a field is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub resume_last_updated_days: u32,
    pub target_candidates: u32,
    pub max_radius: u32,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            resume_last_updated_days: 30,
            target_candidates: 100,
            max_radius: 25,
        }
    }
}

impl FormDefaults {
    pub fn apply(&self, form: &mut NewSearch) {
        form.resume_last_updated_days = form
            .resume_last_updated_days
            .or(Some(self.resume_last_updated_days));
        form.target_candidates = form.target_candidates.or(Some(self.target_candidates));
        form.max_radius = form.max_radius.or(Some(self.max_radius));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: Locale,
    pub database_path: Option<PathBuf>,
    pub defaults: FormDefaults,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "scout")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the user config, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.locale, Locale::De);
        assert_eq!(config.database_path, None);
        assert_eq!(config.defaults.target_candidates, 100);
    }

    #[test]
    fn test_parse_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "locale = \"en\"\ndatabase_path = \"/tmp/scout.db\"\n\n[defaults]\nmax_radius = 50\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/scout.db")));
        assert_eq!(config.defaults.max_radius, 50);
        assert_eq!(config.defaults.resume_last_updated_days, 30);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "locale = \"klingon\"").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_apply_defaults_keeps_explicit_values() {
        let mut form = NewSearch {
            search_keywords: "DevOps".to_string(),
            max_radius: Some(10),
            ..Default::default()
        };
        FormDefaults::default().apply(&mut form);
        assert_eq!(form.max_radius, Some(10));
        assert_eq!(form.target_candidates, Some(100));
        assert_eq!(form.resume_last_updated_days, Some(30));
    }
}
