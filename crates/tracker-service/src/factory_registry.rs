//! Dynamic factory registry for tracker backends.
//!
//! Collects every storage and notification implementation the backend crates
//! export, so the engine can be built from whatever the configuration names.

use std::collections::HashMap;
use std::sync::OnceLock;
use tracker_config::Config;
use tracker_core::{TrackerBuilder, TrackerEngine, TrackerFactories};
use tracker_notify::NotificationFactory;
use tracker_storage::StorageFactory;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub notifications: HashMap<String, NotificationFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			notifications: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_notifications(&mut self, name: impl Into<String>, factory: NotificationFactory) {
		self.notifications.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, filling it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in tracker_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in tracker_notify::get_all_implementations() {
			tracing::debug!("Registering notification implementation: {}", name);
			registry.register_notifications(name, factory);
		}

		registry
	})
}

/// Picks the factories for every implementation the config names, failing
/// on names no backend crate provides.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Build the tracker engine using the registry and config
pub fn build_engine_from_config(config: Config) -> Result<TrackerEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let notification_factories = build_factories!(
		registry,
		config.notifications.implementations,
		notifications,
		"notification"
	);

	let factories = TrackerFactories {
		storage_factories,
		notification_factories,
	};

	Ok(TrackerBuilder::new(config).build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_config::ConfigBuilder;

	#[test]
	fn test_registry_knows_every_backend() {
		let registry = get_registry();
		assert!(registry.storage.contains_key("memory"));
		assert!(registry.storage.contains_key("file"));
		assert!(registry.notifications.contains_key("memory"));
		assert!(registry.notifications.contains_key("log"));
		assert!(registry.notifications.contains_key("clicksend"));
	}

	#[test]
	fn test_build_with_memory_backends() {
		let engine = build_engine_from_config(ConfigBuilder::new().build()).unwrap();
		assert_eq!(engine.config().tracker.id, "test-tracker");
	}

	#[test]
	fn test_unknown_implementation_lists_available() {
		let config = ConfigBuilder::new()
			.storage("postgres", toml::Value::Table(toml::map::Map::new()))
			.build();
		let err = build_engine_from_config(config).err().unwrap();
		let message = err.to_string();
		assert!(message.contains("Unknown storage implementation 'postgres'"));
		assert!(message.contains("file, memory"));
	}

	#[tokio::test]
	async fn test_build_with_file_storage() {
		let dir = tempfile::tempdir().unwrap();
		let mut table = toml::map::Map::new();
		table.insert(
			"storage_path".into(),
			toml::Value::String(dir.path().to_string_lossy().into_owned()),
		);
		let config = ConfigBuilder::new()
			.storage("file", toml::Value::Table(table))
			.build();
		let engine = build_engine_from_config(config).unwrap();
		engine.initialize().await.unwrap();
	}
}
