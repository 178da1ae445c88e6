use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.toml";

/// Optional `settings.toml`. Every field falls back to a platform default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Where standardized datasets are stored.
    pub data_dir: Option<PathBuf>,
    /// Directory holding `comchain.json`, `cyclos.json` and `kohinos.json`.
    /// The built-in catalog is used when unset.
    pub patterns_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse settings")
    }

    /// Reads `path` if given, otherwise the settings file in the platform
    /// config directory when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match project_dirs().map(|d| d.config_dir().join(SETTINGS_FILE)) {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = Self::from_toml(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => project_dirs()
                .map(|d| d.data_dir().join("datasets"))
                .ok_or_else(|| anyhow!("No home directory; set data_dir in {SETTINGS_FILE}")),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "monnaie", "Monnaie")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_directories() {
        let settings = Settings::from_toml(
            r#"
            data_dir = "/srv/monnaie/data"
            patterns_dir = "/srv/monnaie/patterns"
            "#,
        )
        .unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("/srv/monnaie/data")));
        assert_eq!(settings.patterns_dir, Some(PathBuf::from("/srv/monnaie/patterns")));
        assert_eq!(settings.data_dir().unwrap(), PathBuf::from("/srv/monnaie/data"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml("upload_dir = \"x\"").is_err());
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "data_dir = \"datasets\"\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("datasets")));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
