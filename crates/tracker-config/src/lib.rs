//! Configuration module for the fleet tracker.
//!
//! This module provides structures and utilities for managing tracker
//! configuration. It supports loading configuration from TOML files and
//! validates that all required values are properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

pub mod builders;
mod loader;

pub use builders::config::ConfigBuilder;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracker_types::SecretString;

/// Minimum accepted length of the session signing secret.
pub const MIN_TOKEN_SECRET_LEN: usize = 16;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep only the message; the default rendering dumps the whole input.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the tracker.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this tracker instance.
	pub tracker: TrackerConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for SMS notifications.
	pub notifications: NotificationConfig,
	/// Session and cookie settings.
	pub auth: AuthConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
	/// Initial admin account, created on startup when missing.
	pub bootstrap: Option<BootstrapConfig>,
}

/// Configuration specific to the tracker instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
	/// Unique identifier for this tracker instance.
	pub id: String,
	/// Base URL of the web client, used for links in notifications.
	#[serde(default = "default_client_url")]
	pub client_url: String,
}

fn default_client_url() -> String {
	"http://localhost:5173".to_string()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Interval in seconds for cleaning up expired storage entries.
	#[serde(default = "default_cleanup_interval")]
	pub cleanup_interval_seconds: u64,
}

fn default_cleanup_interval() -> u64 {
	3600
}

/// Configuration for SMS notifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of notification implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// HMAC key used to sign session tokens.
	pub token_secret: SecretString,
	/// Session lifetime in days.
	#[serde(default = "default_token_ttl_days")]
	pub token_ttl_days: u64,
	/// Whether the session cookie carries the `Secure` attribute.
	#[serde(default)]
	pub cookie_secure: bool,
	/// bcrypt cost factor for stored password hashes.
	#[serde(default = "default_password_hash_cost")]
	pub password_hash_cost: u32,
}

fn default_token_ttl_days() -> u64 {
	7
}

fn default_password_hash_cost() -> u32 {
	12
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
	/// CORS configuration.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Origins allowed to send credentialed requests.
	pub allowed_origins: Vec<String>,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	5000
}

fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Initial admin account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
	pub admin_email: String,
	pub admin_password: SecretString,
	#[serde(default = "default_admin_first_name")]
	pub admin_first_name: String,
	#[serde(default = "default_admin_last_name")]
	pub admin_last_name: String,
}

fn default_admin_first_name() -> String {
	"Admin".to_string()
}

fn default_admin_last_name() -> String {
	"User".to_string()
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives and
	/// resolving environment variables.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Session lifetime as seconds.
	pub fn token_ttl_seconds(&self) -> u64 {
		self.auth.token_ttl_days.saturating_mul(24 * 60 * 60)
	}

	/// Validates the configuration to ensure all required fields are
	/// properly set.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.tracker.id.is_empty() {
			return Err(ConfigError::Validation("Tracker ID cannot be empty".into()));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}
		if self.storage.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.storage.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"Storage cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		if self.notifications.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one notification implementation must be configured".into(),
			));
		}
		if !self
			.notifications
			.implementations
			.contains_key(&self.notifications.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary notification backend '{}' not found in implementations",
				self.notifications.primary
			)));
		}

		if self.auth.token_secret.len() < MIN_TOKEN_SECRET_LEN {
			return Err(ConfigError::Validation(format!(
				"auth.token_secret must be at least {} characters",
				MIN_TOKEN_SECRET_LEN
			)));
		}
		if self.auth.token_ttl_days == 0 || self.auth.token_ttl_days > 365 {
			return Err(ConfigError::Validation(
				"auth.token_ttl_days must be between 1 and 365".into(),
			));
		}
		if !(4..=31).contains(&self.auth.password_hash_cost) {
			return Err(ConfigError::Validation(
				"auth.password_hash_cost must be between 4 and 31".into(),
			));
		}

		if let Some(ref api) = self.api {
			if api.enabled && api.max_request_size == 0 {
				return Err(ConfigError::Validation(
					"api.max_request_size must be greater than 0".into(),
				));
			}
			let wildcard = api
				.cors
				.iter()
				.flat_map(|cors| &cors.allowed_origins)
				.any(|origin| origin.trim() == "*");
			if wildcard {
				return Err(ConfigError::Validation(
					"api.cors.allowed_origins cannot contain \"*\" because session cookies are sent with credentials; list each origin".into(),
				));
			}
		}

		if let Some(ref bootstrap) = self.bootstrap {
			if bootstrap.admin_email.trim().is_empty() {
				return Err(ConfigError::Validation(
					"bootstrap.admin_email cannot be empty".into(),
				));
			}
			if bootstrap.admin_password.len() < 8 {
				return Err(ConfigError::Validation(
					"bootstrap.admin_password must be at least 8 characters".into(),
				));
			}
		}

		Ok(())
	}
}

/// Parses a TOML string. Environment variables are resolved and the
/// configuration is validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[tracker]
id = "fleet-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[notifications]
primary = "log"
[notifications.implementations.log]

[auth]
token_secret = "0123456789abcdef0123"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TRACKER_TEST_HOST", "localhost");
		std::env::set_var("TRACKER_TEST_PORT", "5432");

		let input = "host = \"${TRACKER_TEST_HOST}:${TRACKER_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("TRACKER_TEST_HOST");
		std::env::remove_var("TRACKER_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${TRACKER_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${TRACKER_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("TRACKER_MISSING_VAR"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.tracker.id, "fleet-test");
		assert_eq!(config.tracker.client_url, "http://localhost:5173");
		assert_eq!(config.storage.cleanup_interval_seconds, 3600);
		assert_eq!(config.auth.token_ttl_days, 7);
		assert_eq!(config.token_ttl_seconds(), 7 * 24 * 3600);
		assert!(!config.auth.cookie_secure);
		assert!(config.api.is_none());
		assert!(config.bootstrap.is_none());
	}

	#[test]
	fn test_secret_from_env_is_redacted_in_debug() {
		std::env::set_var("TRACKER_TEST_SECRET", "a-very-long-signing-secret");
		let config_str = BASE.replace(
			"token_secret = \"0123456789abcdef0123\"",
			"token_secret = \"${TRACKER_TEST_SECRET}\"",
		);
		let config: Config = config_str.parse().unwrap();
		assert_eq!(
			config.auth.token_secret.expose_secret(),
			"a-very-long-signing-secret"
		);
		assert!(!format!("{:?}", config).contains("a-very-long-signing-secret"));
		std::env::remove_var("TRACKER_TEST_SECRET");
	}

	#[test]
	fn test_short_secret_rejected() {
		let config_str = BASE.replace("0123456789abcdef0123", "short");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("token_secret"));
	}

	#[test]
	fn test_ttl_bounds() {
		let zero = format!("{}token_ttl_days = 0\n", BASE);
		assert!(Config::from_str(&zero).is_err());
		let long = format!("{}token_ttl_days = 400\n", BASE);
		assert!(Config::from_str(&long).is_err());
		let ok = format!("{}token_ttl_days = 30\n", BASE);
		assert_eq!(Config::from_str(&ok).unwrap().auth.token_ttl_days, 30);
	}

	#[test]
	fn test_unknown_primary_rejected() {
		let config_str = BASE.replace("primary = \"log\"", "primary = \"clicksend\"");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("'clicksend' not found"));

		let config_str = BASE.replace("primary = \"memory\"", "primary = \"file\"");
		assert!(Config::from_str(&config_str).is_err());
	}

	#[test]
	fn test_cleanup_interval_bounds() {
		let config_str = BASE.replace(
			"primary = \"memory\"",
			"primary = \"memory\"\ncleanup_interval_seconds = 0",
		);
		assert!(Config::from_str(&config_str).is_err());
	}

	#[test]
	fn test_bootstrap_and_api_sections() {
		let config_str = format!(
			"{}{}",
			BASE,
			r#"
[api]
enabled = true
port = 8080
[api.cors]
allowed_origins = ["http://localhost:5173"]

[bootstrap]
admin_email = "admin@example.com"
admin_password = "changeme-now"
"#
		);
		let config = Config::from_str(&config_str).unwrap();
		let api = config.api.unwrap();
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 8080);
		assert_eq!(api.max_request_size, 1024 * 1024);
		assert_eq!(api.cors.unwrap().allowed_origins, vec!["http://localhost:5173"]);
		let bootstrap = config.bootstrap.unwrap();
		assert_eq!(bootstrap.admin_first_name, "Admin");
		assert_eq!(bootstrap.admin_password.expose_secret(), "changeme-now");
	}

	#[test]
	fn test_wildcard_cors_origin_rejected() {
		let config_str = format!(
			"{}{}",
			BASE,
			r#"
[api]
enabled = true
[api.cors]
allowed_origins = ["http://localhost:5173", "*"]
"#
		);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("api.cors.allowed_origins cannot contain \"*\""));
	}
}
