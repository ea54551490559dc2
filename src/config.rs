use crate::core::naming::{RULE_PREFIX, RuleNamer};
use crate::utils::get_data_dir;
use crate::validators::validate_rule_prefix;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const CONFIG_FILE: &str = "config.json";

/// Application configuration.
///
/// Loaded once at startup and handed to components by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefix marking rules owned by appblock. Changing it hides rules
    /// created under the old prefix from `list` and `remove`.
    #[serde(default = "default_rule_prefix")]
    pub rule_prefix: String,
    /// Patterns used when `block` is run without `--ext`
    #[serde(default = "default_extensions")]
    pub default_extensions: Vec<String>,
    /// Keywords always excluded in addition to `--exclude-keyword`
    #[serde(default)]
    pub default_excluded_keywords: Vec<String>,
    /// File names always excluded in addition to `--exclude-file`
    #[serde(default)]
    pub default_excluded_files: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rule_prefix: default_rule_prefix(),
            default_extensions: default_extensions(),
            default_excluded_keywords: Vec::new(),
            default_excluded_files: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn namer(&self) -> RuleNamer {
        RuleNamer::new(self.rule_prefix.clone())
    }
}

fn default_rule_prefix() -> String {
    RULE_PREFIX.to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["*.exe".to_string()]
}

fn config_path() -> Option<PathBuf> {
    get_data_dir().map(|dir| dir.join(CONFIG_FILE))
}

/// Saves the config to `path` using an atomic write pattern.
/// 1. Writes to a temporary file in the same directory.
/// 2. Flushes it to disk.
/// 3. Atomically renames it over the target path.
///
/// On Unix the temporary file is created with mode 0o600 by `tempfile`.
pub fn save_config_to(config: &AppConfig, path: &Path) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_string_pretty(config)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(json.as_bytes())?;
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::StorageFull {
            std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                "Disk full: cannot save configuration. Free up space and try again.",
            )
        } else {
            e.error
        }
    })?;
    Ok(())
}

/// Saves the config to the data directory.
pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    match config_path() {
        Some(path) => save_config_to(config, &path),
        None => Ok(()),
    }
}

/// Loads the config at `path`, or returns the default if it is missing or
/// unreadable.
///
/// An unusable `rule_prefix` is replaced by [`RULE_PREFIX`].
pub fn load_config_from(path: &Path) -> AppConfig {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppConfig::default(),
        Err(e) => {
            warn!("Cannot read {}: {e}; using defaults", path.display());
            return AppConfig::default();
        }
    };

    let mut config: AppConfig = serde_json::from_str(&json).unwrap_or_else(|e| {
        warn!("Invalid config {}: {e}; using defaults", path.display());
        AppConfig::default()
    });

    if let Err(e) = validate_rule_prefix(&config.rule_prefix) {
        warn!(
            "Ignoring rule_prefix {:?} in {}: {e}",
            config.rule_prefix,
            path.display()
        );
        config.rule_prefix = default_rule_prefix();
    }

    config
}

/// Loads the config from the data directory, or returns the default.
pub fn load_config() -> AppConfig {
    config_path().map_or_else(AppConfig::default, |path| load_config_from(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.rule_prefix, RULE_PREFIX);
        assert_eq!(config.default_extensions, vec!["*.exe"]);
        assert_eq!(config.namer().prefix(), RULE_PREFIX);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"default_excluded_keywords":["setup"]}"#).unwrap();
        assert_eq!(config.rule_prefix, RULE_PREFIX);
        assert_eq!(config.default_extensions, vec!["*.exe"]);
        assert_eq!(config.default_excluded_keywords, vec!["setup"]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let config = AppConfig {
            default_extensions: vec!["*.exe".into(), "*.dll".into()],
            default_excluded_files: vec!["uninstall.exe".into()],
            ..AppConfig::default()
        };
        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path), config);
        // No temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_missing_or_corrupt_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(load_config_from(&path), AppConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config_from(&path), AppConfig::default());
    }

    #[test]
    fn test_blank_prefix_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        for prefix in ["", "   "] {
            let json = serde_json::json!({
                "rule_prefix": prefix,
                "default_excluded_keywords": ["setup"],
            });
            std::fs::write(&path, json.to_string()).unwrap();

            let config = load_config_from(&path);
            assert_eq!(config.rule_prefix, RULE_PREFIX);
            // Other settings survive
            assert_eq!(config.default_excluded_keywords, vec!["setup"]);
        }
    }

    #[test]
    fn test_overlong_prefix_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, serde_json::json!({ "rule_prefix": "X".repeat(30) }).to_string())
            .unwrap();

        assert_eq!(load_config_from(&path).rule_prefix, RULE_PREFIX);
    }

    #[test]
    fn test_short_custom_prefix_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"rule_prefix":"Lab Block: "}"#).unwrap();

        assert_eq!(load_config_from(&path).rule_prefix, "Lab Block: ");
    }
}
