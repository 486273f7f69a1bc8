//! Builder pattern for constructing tracker engines.
//!
//! Composes a TrackerEngine from the configured storage and notification
//! implementations using factory functions, so backends stay pluggable.

use crate::engine::TrackerEngine;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracker_config::Config;
use tracker_notify::{NotificationInterface, NotificationService, NotifyError};
use tracker_storage::{StorageError, StorageInterface, StorageService};

/// Errors that can occur during tracker engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every backend kind, keyed by implementation name.
pub struct TrackerFactories<SF, NF> {
	pub storage_factories: HashMap<String, SF>,
	pub notification_factories: HashMap<String, NF>,
}

/// Builder for constructing a TrackerEngine with pluggable implementations.
pub struct TrackerBuilder {
	config: Config,
}

impl TrackerBuilder {
	/// Creates a new TrackerBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the TrackerEngine, instantiating each configured implementation
	/// and selecting the primary one of each kind.
	pub fn build<SF, NF>(self, factories: TrackerFactories<SF, NF>) -> Result<TrackerEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		NF: Fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotifyError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(component = "storage", implementation = %name, "Unknown implementation, skipping");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::Config(
				"No valid storage implementations available".into(),
			));
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		// Create notification implementations
		let mut notification_impls = HashMap::new();
		for (name, config) in &self.config.notifications.implementations {
			let Some(factory) = factories.notification_factories.get(name) else {
				tracing::warn!(component = "notifications", implementation = %name, "Unknown implementation, skipping");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					notification_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.notifications.primary == name;
					tracing::info!(component = "notifications", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "notifications",
						implementation = %name,
						error = %e,
						"Failed to create notification implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create notification implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_notifications = &self.config.notifications.primary;
		let notification_backend = notification_impls
			.remove(primary_notifications)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"Primary notifications '{}' failed to load or has invalid configuration",
					primary_notifications
				))
			})?;
		let notifications = Arc::new(NotificationService::new(
			notification_backend,
			self.config.tracker.client_url.clone(),
		));

		Ok(TrackerEngine::new(self.config, storage, notifications))
	}
}
