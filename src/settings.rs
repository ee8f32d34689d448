use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::connection::{ANONYMOUS_USER, ConnectionConfig, DEFAULT_PORT, MIN_TIMEOUT_SECS};
use crate::navigator::ROOT;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub connection: ConnectionSettings,
    pub preferences: Preferences,
}

/// Saved connection defaults. The password is never written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub start_directory: String,
    /// Rows shown in a CSV preview
    pub preview_rows: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: String::new(), // Empty by default - user must configure
            port: DEFAULT_PORT,
            username: ANONYMOUS_USER.to_string(),
            timeout_secs: MIN_TIMEOUT_SECS,
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            start_directory: ROOT.to_string(),
            preview_rows: 200,
        }
    }
}

impl ConnectionSettings {
    pub fn to_config(&self, password: &str) -> ConnectionConfig {
        ConnectionConfig::new(&self.host, &self.username, password)
            .with_port(self.port)
            .with_timeout_secs(self.timeout_secs)
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl AppSettings {
    fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir()
            .ok_or("Could not determine config directory")?
            .join("ftp-browser");

        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("settings.json"))
    }

    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_file = Self::config_path()?;

        log::debug!("Loading settings from: {:?}", config_file);

        if config_file.exists() {
            let contents = fs::read_to_string(&config_file)?;
            let settings = Self::from_json(&contents)?;
            log::info!("Settings loaded successfully");
            Ok(settings)
        } else {
            log::info!("No settings file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_file = Self::config_path()?;

        log::debug!("Saving settings to: {:?}", config_file);

        fs::write(&config_file, self.to_json()?)?;

        log::info!("Settings saved successfully");
        Ok(())
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert!(settings.connection.host.is_empty());
        assert_eq!(settings.connection.port, 21);
        assert_eq!(settings.connection.username, "anonymous");
        assert_eq!(settings.connection.timeout_secs, 20);
        assert_eq!(settings.preferences.start_directory, "/");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let settings = AppSettings::from_json(r#"{"connection": {"host": "ftp.example.com"}}"#)
            .unwrap();
        assert_eq!(settings.connection.host, "ftp.example.com");
        assert_eq!(settings.connection.port, 21);
        assert_eq!(settings.preferences, Preferences::default());
    }

    #[test]
    fn test_password_is_not_serialized() {
        let config = ConnectionConfig::new("ftp.example.com", "gorden", "myStrongPassword")
            .with_port(2121);
        let settings = AppSettings {
            connection: ConnectionSettings::from_config(&config),
            preferences: Preferences::default(),
        };

        let json = settings.to_json().unwrap();
        assert!(!json.contains("myStrongPassword"));

        let restored = AppSettings::from_json(&json).unwrap();
        assert_eq!(restored, settings);
        assert_eq!(
            restored.connection.to_config("myStrongPassword"),
            config
        );
    }
}
