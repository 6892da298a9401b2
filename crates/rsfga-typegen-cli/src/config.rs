//! Configuration management for the generator CLI.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Environment variables (`FGA_` prefix)
//! 3. Configuration file (YAML, overrides)
//!
//! # Configuration Hierarchy
//!
//! File values take precedence over environment variables, which take
//! precedence over defaults. Settings absent from the file, such as
//! `api_token`, can still come from `FGA_API_TOKEN`.
//!
//! # Example
//!
//! ```yaml
//! store_id: 01HVMMBCMGZNT3SED4Z17ECXCA
//! api_url: http://localhost:8080
//! authorization_model_id: 01HVMMBD3YQ2WZ3D2Q8YKNQ8RZ
//! output: src/generated/fga-types.generated.ts
//! logging:
//!   level: debug
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use rsfga_typegen::DEFAULT_FILE_NAME;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fga-typegen.yaml";

/// Generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TypegenConfig {
    /// Store to read the model from
    #[serde(default)]
    pub store_id: Option<String>,

    /// Base URL of the OpenFGA API
    #[serde(default)]
    pub api_url: Option<String>,

    /// Model to generate from; the latest model when absent
    #[serde(default)]
    pub authorization_model_id: Option<String>,

    /// Bearer token sent with API requests
    #[serde(default)]
    pub api_token: Option<String>,

    /// Local JSON or DSL model; skips the API entirely
    #[serde(default)]
    pub model_file: Option<String>,

    /// Path of the generated module
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for TypegenConfig {
    fn default() -> Self {
        Self {
            store_id: None,
            api_url: None,
            authorization_model_id: None,
            api_token: None,
            model_file: None,
            output: default_output(),
            request_timeout_secs: default_request_timeout(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_output() -> String {
    DEFAULT_FILE_NAME.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the model comes from once configuration is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource<'a> {
    File(&'a str),
    Api {
        api_url: &'a str,
        store_id: &'a str,
        authorization_model_id: Option<&'a str>,
    },
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn environment() -> Environment {
    // FGA_STORE_ID -> store_id, FGA_LOGGING__LEVEL -> logging.level
    Environment::with_prefix("FGA")
        .prefix_separator("_")
        .separator("__")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl TypegenConfig {
    /// Load configuration from a YAML file layered over `FGA_` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError::FileNotFound` if `path` does not exist, and
    /// `ConfigLoadError::Invalid` if the merged configuration fails [`validate`](Self::validate).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&TypegenConfig::default())?)
            .add_source(environment())
            .add_source(File::from(path).format(FileFormat::Yaml))
            .build()?;

        let typegen_config: TypegenConfig = config.try_deserialize()?;
        typegen_config.validate()?;

        Ok(typegen_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&TypegenConfig::default())?)
            .add_source(environment())
            .build()?;

        let typegen_config: TypegenConfig = config.try_deserialize()?;
        typegen_config.validate()?;

        Ok(typegen_config)
    }

    /// Validate the configuration.
    ///
    /// `store_id` and `api_url` are required unless `model_file` is set.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if non_empty(&self.model_file).is_none() {
            let mut missing = Vec::new();
            if non_empty(&self.store_id).is_none() {
                missing.push("store_id (FGA_STORE_ID)");
            }
            if non_empty(&self.api_url).is_none() {
                missing.push("api_url (FGA_API_URL)");
            }
            if !missing.is_empty() {
                return Err(ConfigLoadError::Invalid {
                    message: format!(
                        "missing required setting(s): {}; set them or configure model_file",
                        missing.join(", ")
                    ),
                });
            }
        }

        if self.output.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "output must not be empty".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }

    /// The model source selected by this configuration. A local file wins over the API.
    ///
    /// Returns `None` only for configurations that did not pass [`validate`](Self::validate).
    pub fn model_source(&self) -> Option<ModelSource<'_>> {
        if let Some(file) = non_empty(&self.model_file) {
            return Some(ModelSource::File(file));
        }
        Some(ModelSource::Api {
            api_url: non_empty(&self.api_url)?,
            store_id: non_empty(&self.store_id)?,
            authorization_model_id: non_empty(&self.authorization_model_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        for key in [
            "FGA_STORE_ID",
            "FGA_API_URL",
            "FGA_API_TOKEN",
            "FGA_OUTPUT",
            "FGA_LOGGING__LEVEL",
        ] {
            std::env::remove_var(key);
        }
    }

    fn api_config() -> TypegenConfig {
        TypegenConfig {
            store_id: Some("01HVMMBCMGZNT3SED4Z17ECXCA".to_string()),
            api_url: Some("http://localhost:8080".to_string()),
            ..Default::default()
        }
    }

    /// Test: Can load config from YAML file
    #[test]
    #[serial]
    fn test_can_load_config_from_yaml_file() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
store_id: store-1
api_url: http://localhost:8080
authorization_model_id: model-1
output: generated/fga.ts
request_timeout_secs: 5

logging:
  level: debug
  json: true
"#
        )
        .unwrap();

        let config = TypegenConfig::load(file.path()).unwrap();

        assert_eq!(config.store_id.as_deref(), Some("store-1"));
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.authorization_model_id.as_deref(), Some("model-1"));
        assert_eq!(config.output, "generated/fga.ts");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    /// Test: File values win over environment variables
    #[test]
    #[serial]
    fn test_file_values_override_env_vars() {
        clear_env();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
store_id: from-file
api_url: http://file.example
"#
        )
        .unwrap();

        std::env::set_var("FGA_STORE_ID", "from-env");
        std::env::set_var("FGA_API_TOKEN", "secret");
        std::env::set_var("FGA_LOGGING__LEVEL", "warn");

        let config = TypegenConfig::load(file.path());
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.store_id.as_deref(), Some("from-file"));
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    #[serial]
    fn test_from_env_requires_store_and_url() {
        clear_env();
        let err = TypegenConfig::from_env().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("store_id"), "{message}");
        assert!(message.contains("api_url"), "{message}");

        std::env::set_var("FGA_STORE_ID", "store-1");
        std::env::set_var("FGA_API_URL", "http://localhost:8080");
        let config = TypegenConfig::from_env();
        clear_env();
        let config = config.unwrap();
        assert_eq!(config.output, DEFAULT_FILE_NAME);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = TypegenConfig::load("/nonexistent/fga-typegen.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_model_file_makes_api_settings_optional() {
        let config = TypegenConfig {
            model_file: Some("model.fga".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.model_source(), Some(ModelSource::File("model.fga")));
    }

    #[test]
    fn test_config_validation_catches_errors() {
        let blank_store = TypegenConfig {
            store_id: Some("  ".to_string()),
            ..api_config()
        };
        assert!(blank_store.validate().is_err());

        let zero_timeout = TypegenConfig {
            request_timeout_secs: 0,
            ..api_config()
        };
        assert!(zero_timeout.validate().is_err());

        let mut bad_level = api_config();
        bad_level.logging.level = "verbose".to_string();
        let err = bad_level.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        assert!(api_config().validate().is_ok());
    }

    #[test]
    fn test_model_source_for_api() {
        let config = TypegenConfig {
            authorization_model_id: Some("model-1".to_string()),
            ..api_config()
        };
        assert_eq!(
            config.model_source(),
            Some(ModelSource::Api {
                api_url: "http://localhost:8080",
                store_id: "01HVMMBCMGZNT3SED4Z17ECXCA",
                authorization_model_id: Some("model-1"),
            })
        );
        assert_eq!(TypegenConfig::default().model_source(), None);
    }
}
