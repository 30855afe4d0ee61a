//! Configuration loading and management
//!
//! Configuration is read from YAML and then selectively overridden by
//! environment variables:
//!
//! | variable | key |
//! |---|---|
//! | `DONATION_BIND` | `server.bind` |
//! | `DONATION_EXPOSE_ERRORS` | `server.expose_internal_errors` |
//! | `JWT_SECRET` | `auth.jwt_secret` |
//! | `DONATION_STORAGE` | `storage.backend` |
//! | `DATABASE_URL` | `storage.database_url` |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::catalog::Category;
use crate::core::error::ConfigError;
use crate::core::query::PageLimits;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Attach the underlying cause of internal failures to error responses
    pub expose_internal_errors: bool,

    /// Allow any origin, method and header
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            expose_internal_errors: false,
            cors_permissive: false,
        }
    }
}

/// Bearer token settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub jwt_issuer: Option<String>,
}

/// Which store backs donation requests and the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in_memory" | "in-memory" | "memory" => Ok(StorageBackend::InMemory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::InvalidValue {
                field: "storage.backend".to_string(),
                value: other.to_string(),
                message: "expected 'in_memory' or 'postgres'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Data loaded into a fresh catalog on startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub categories: Vec<Category>,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub pagination: PageLimits,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub seed: SeedConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string(),
            },
            _ => ConfigError::Parse {
                file: Some(path.to_string()),
                message: e.to_string(),
            },
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            file: Some(path.to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
            file: None,
            message: e.to_string(),
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("DONATION_BIND") {
            self.server.bind = bind;
        }
        if let Some(flag) = lookup("DONATION_EXPOSE_ERRORS") {
            self.server.expose_internal_errors = parse_flag("DONATION_EXPOSE_ERRORS", &flag)?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(backend) = lookup("DONATION_STORAGE") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.pagination;
        if limits.max_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.max_limit".to_string(),
                value: limits.max_limit.to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if limits.default_limit == 0 || limits.default_limit > limits.max_limit {
            return Err(ConfigError::InvalidValue {
                field: "pagination.default_limit".to_string(),
                value: limits.default_limit.to_string(),
                message: format!("must be between 1 and {}", limits.max_limit),
            });
        }
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none()
        {
            return Err(ConfigError::MissingField {
                field: "database_url".to_string(),
                context: "storage (postgres backend)".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: name.to_string(),
            value: other.to_string(),
            message: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(!config.server.expose_internal_errors);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.storage.backend, StorageBackend::InMemory);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
server:
  bind: 0.0.0.0:8080
pagination:
  default_limit: 20
seed:
  categories:
    - id: 6f1c1b1e-7c1a-4d44-9a53-2a0f4f3f0a11
      name: Kidney
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(!config.server.cors_permissive);
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.seed.categories.len(), 1);
        assert_eq!(config.seed.categories[0].name, "Kidney");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  backend: postgres\n  database_url: postgres://x").unwrap();

        let config = AppConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = AppConfig::from_yaml_str("server: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { file: None, .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DONATION_BIND", "0.0.0.0:9000"),
            ("DONATION_EXPOSE_ERRORS", "true"),
            ("JWT_SECRET", "s3cret"),
            ("DONATION_STORAGE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/donations"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert!(config.server.expose_internal_errors);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = AppConfig::default();
        assert!(
            config
                .apply_overrides(|key| (key == "DONATION_STORAGE").then(|| "redis".to_string()))
                .is_err()
        );
        assert!(
            config
                .apply_overrides(|key| (key == "DONATION_EXPOSE_ERRORS").then(|| "maybe".to_string()))
                .is_err()
        );
    }

    #[test]
    fn test_validate_limits() {
        let mut config = AppConfig::default();
        config.pagination.default_limit = 0;
        assert!(config.validate().is_err());

        config.pagination.default_limit = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Postgres;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }
}
