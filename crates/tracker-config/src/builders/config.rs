//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults: in-memory storage, the in-memory notification backend
//! and a fixed signing secret.

use crate::{
	ApiConfig, AuthConfig, BootstrapConfig, Config, NotificationConfig, StorageConfig,
	TrackerConfig,
};
use std::collections::HashMap;
use tracker_types::SecretString;

/// Builder for creating `Config` instances with a fluent API.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	tracker_id: String,
	client_url: String,
	storage_primary: String,
	storage_implementations: HashMap<String, toml::Value>,
	storage_cleanup_interval_seconds: u64,
	notifications_primary: String,
	notification_implementations: HashMap<String, toml::Value>,
	token_secret: String,
	token_ttl_days: u64,
	cookie_secure: bool,
	password_hash_cost: u32,
	api: Option<ApiConfig>,
	bootstrap: Option<BootstrapConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			tracker_id: "test-tracker".to_string(),
			client_url: "http://localhost:5173".to_string(),
			storage_primary: "memory".to_string(),
			storage_implementations: HashMap::from([("memory".to_string(), empty_table())]),
			storage_cleanup_interval_seconds: 60,
			notifications_primary: "memory".to_string(),
			notification_implementations: HashMap::from([("memory".to_string(), empty_table())]),
			token_secret: "test-secret-0123456789".to_string(),
			token_ttl_days: 7,
			cookie_secure: false,
			password_hash_cost: 4,
			api: None,
			bootstrap: None,
		}
	}

	pub fn tracker_id(mut self, id: impl Into<String>) -> Self {
		self.tracker_id = id.into();
		self
	}

	/// Sets the web client base URL used in notification links.
	pub fn client_url(mut self, url: impl Into<String>) -> Self {
		self.client_url = url.into();
		self
	}

	/// Selects the primary storage backend and its table.
	pub fn storage(mut self, primary: impl Into<String>, table: toml::Value) -> Self {
		let primary = primary.into();
		self.storage_implementations.insert(primary.clone(), table);
		self.storage_primary = primary;
		self
	}

	pub fn storage_cleanup_interval_seconds(mut self, interval: u64) -> Self {
		self.storage_cleanup_interval_seconds = interval;
		self
	}

	/// Selects the primary notification backend and its table.
	pub fn notifications(mut self, primary: impl Into<String>, table: toml::Value) -> Self {
		let primary = primary.into();
		self.notification_implementations
			.insert(primary.clone(), table);
		self.notifications_primary = primary;
		self
	}

	pub fn token_secret(mut self, secret: impl Into<String>) -> Self {
		self.token_secret = secret.into();
		self
	}

	pub fn token_ttl_days(mut self, days: u64) -> Self {
		self.token_ttl_days = days;
		self
	}

	pub fn cookie_secure(mut self, secure: bool) -> Self {
		self.cookie_secure = secure;
		self
	}

	/// bcrypt cost; the default of 4 keeps tests fast.
	pub fn password_hash_cost(mut self, cost: u32) -> Self {
		self.password_hash_cost = cost;
		self
	}

	/// Sets the API configuration.
	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	/// Seeds an initial admin account.
	pub fn bootstrap_admin(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
		self.bootstrap = Some(BootstrapConfig {
			admin_email: email.into(),
			admin_password: SecretString::new(password.into()),
			admin_first_name: "Admin".to_string(),
			admin_last_name: "User".to_string(),
		});
		self
	}

	/// Builds the `Config` with the configured values. The result is not
	/// validated; call [`Config::validate`] when that matters.
	pub fn build(self) -> Config {
		Config {
			tracker: TrackerConfig {
				id: self.tracker_id,
				client_url: self.client_url,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations: self.storage_implementations,
				cleanup_interval_seconds: self.storage_cleanup_interval_seconds,
			},
			notifications: NotificationConfig {
				primary: self.notifications_primary,
				implementations: self.notification_implementations,
			},
			auth: AuthConfig {
				token_secret: SecretString::new(self.token_secret),
				token_ttl_days: self.token_ttl_days,
				cookie_secure: self.cookie_secure,
				password_hash_cost: self.password_hash_cost,
			},
			api: self.api,
			bootstrap: self.bootstrap,
		}
	}
}
