use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::KdfLevel;
use crate::errors::{Result, VaultError};

/// Settings for one data directory, loaded from `config.toml`.
///
/// Every field has a default, so no config file is needed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// KDF cost level for newly created vaults.
    #[serde(default)]
    pub kdf_level: KdfLevel,

    /// Minimum length of a new master password, in characters.
    #[serde(default = "default_min_master_length")]
    pub min_master_length: usize,

    /// Write audit records to `audit.db`.
    #[serde(default = "default_audit")]
    pub audit: bool,
}

fn default_min_master_length() -> usize {
    8
}

fn default_audit() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kdf_level: KdfLevel::default(),
            min_master_length: default_min_master_length(),
            audit: default_audit(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the data directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load `<data_dir>/config.toml`.
    ///
    /// A missing file yields the defaults; a file that does not parse is
    /// an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.kdf_level, KdfLevel::Medium);
        assert_eq!(s.min_master_length, 8);
        assert!(s.audit);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Settings::load(tmp.path()).unwrap(), Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
kdf_level = "HEAVY"
min_master_length = 12
audit = false
"#;
        fs::write(tmp.path().join("config.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.kdf_level, KdfLevel::Heavy);
        assert_eq!(settings.min_master_length, 12);
        assert!(!settings.audit);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "kdf_level = \"LIGHT\"\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.kdf_level, KdfLevel::Light);
        assert_eq!(settings.min_master_length, 8);
        assert!(settings.audit);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "not valid {{toml").unwrap();
        assert!(matches!(
            Settings::load(tmp.path()),
            Err(VaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_level() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "kdf_level = \"EXTREME\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }
}
