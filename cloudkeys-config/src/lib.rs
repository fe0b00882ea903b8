//! Configuration management for the Cloudkeys demo

use serde::Deserialize;
use std::env;

/// Default settings file, the counterpart of the original demo's
/// `appsettings.json`.
const DEFAULT_SETTINGS_FILE: &str = "cloudkeys.json";

/// Application configuration
///
/// Layered from an optional JSON settings file and `CLOUDKEYS_`-prefixed
/// environment variables; secrets (the credential file location) are
/// expected to come from the environment rather than the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub project_id: String,
    pub location_id: String,
    pub key_ring_id: String,
    pub key_id: String,
    /// Path to a service account JSON key. Falls back to
    /// `GOOGLE_APPLICATION_CREDENTIALS` when unset.
    #[serde(default)]
    pub credentials_file: Option<String>,
    /// Override for the KMS endpoint (tests, private endpoints).
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from the settings file and environment.
    ///
    /// The settings file path defaults to `cloudkeys.json` and can be
    /// overridden with `CLOUDKEYS_CONFIG`; the file itself is optional.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let settings_file =
            env::var("CLOUDKEYS_CONFIG").unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_string());

        Self::load_from_file(&settings_file)
    }

    /// Load configuration from a specific settings file path plus the
    /// environment.
    pub fn load_from_file(settings_file: &str) -> Result<Self, config::ConfigError> {
        let mut app_config: AppConfig = config::Config::builder()
            .set_default("location_id", "global")?
            .set_default("key_ring_id", "my-test-key-ring")?
            .set_default("key_id", "my-test-key")?
            .add_source(config::File::new(settings_file, config::FileFormat::Json).required(false))
            .add_source(config::Environment::with_prefix("CLOUDKEYS"))
            .build()?
            .try_deserialize()?;

        if app_config.credentials_file.is_none() {
            app_config.credentials_file = env::var("GOOGLE_APPLICATION_CREDENTIALS").ok();
        }

        Ok(app_config)
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_settings_file_with_defaults() {
        let file = write_settings(r#"{"project_id": "demo-project"}"#);

        let config = AppConfig::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.project_id, "demo-project");
        assert_eq!(config.location_id, "global");
        assert_eq!(config.key_ring_id, "my-test-key-ring");
        assert_eq!(config.key_id, "my-test-key");
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let file = write_settings(
            r#"{
                "project_id": "demo-project",
                "location_id": "europe-west1",
                "key_ring_id": "prod-ring",
                "key_id": "prod-key",
                "log_level": "debug"
            }"#,
        );

        let config = AppConfig::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.location_id, "europe-west1");
        assert_eq!(config.key_ring_id, "prod-ring");
        assert_eq!(config.key_id, "prod-key");
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_missing_project_id_is_an_error() {
        let file = write_settings(r#"{"location_id": "global"}"#);

        let result = AppConfig::load_from_file(file.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
