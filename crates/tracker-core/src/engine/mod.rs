//! Core tracker engine that wires handlers to shared services.
//!
//! This module contains the main TrackerEngine struct which owns the storage
//! service and one handler per API area, and runs the background maintenance
//! loop. Handlers share the notification service and state machines.

pub mod context;
pub mod lifecycle;

use crate::handlers::{
	AuthHandler, DirectoryHandler, LookupHandler, OrderHandler, PoGroupHandler, RepairHandler,
	WriteLock,
};
use crate::session::SessionSigner;
use crate::state::{OrderStateMachine, RepairStateMachine};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracker_config::Config;
use tracker_notify::NotificationService;
use tracker_storage::StorageService;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Service error: {0}")]
	Service(String),
}

/// Main tracker engine. Cheap to clone; every clone shares the same
/// services and write lock.
#[derive(Clone)]
pub struct TrackerEngine {
	/// Tracker configuration.
	pub(crate) config: Config,
	/// Storage service for persisting records.
	pub(crate) storage: Arc<StorageService>,
	pub(crate) auth_handler: Arc<AuthHandler>,
	pub(crate) directory_handler: Arc<DirectoryHandler>,
	pub(crate) order_handler: Arc<OrderHandler>,
	pub(crate) repair_handler: Arc<RepairHandler>,
	pub(crate) po_group_handler: Arc<PoGroupHandler>,
	pub(crate) lookup_handler: Arc<LookupHandler>,
}

impl TrackerEngine {
	/// Creates a new tracker engine with the given services.
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		notifications: Arc<NotificationService>,
	) -> Self {
		let lock: WriteLock = Arc::new(Mutex::new(()));
		let hash_cost = config.auth.password_hash_cost;

		let order_state = Arc::new(OrderStateMachine::new(storage.clone()));
		let repair_state = Arc::new(RepairStateMachine::new(storage.clone()));

		let signer = SessionSigner::new(
			config.auth.token_secret.clone(),
			chrono::Duration::days(config.auth.token_ttl_days as i64),
		);
		let auth_handler = Arc::new(AuthHandler::new(storage.clone(), signer, hash_cost));

		let directory_handler = Arc::new(DirectoryHandler::new(
			storage.clone(),
			lock.clone(),
			hash_cost,
		));

		let order_handler = Arc::new(OrderHandler::new(
			storage.clone(),
			notifications.clone(),
			order_state.clone(),
			lock.clone(),
		));

		let repair_handler = Arc::new(RepairHandler::new(
			storage.clone(),
			notifications.clone(),
			repair_state,
			lock.clone(),
		));

		let po_group_handler = Arc::new(PoGroupHandler::new(
			storage.clone(),
			order_state,
			lock.clone(),
		));

		let lookup_handler = Arc::new(LookupHandler::new(storage.clone(), lock));

		Self {
			config,
			storage,
			auth_handler,
			directory_handler,
			order_handler,
			repair_handler,
			po_group_handler,
			lookup_handler,
		}
	}

	/// Background maintenance loop. Purges expired storage entries (revoked
	/// sessions) at the configured interval until the task is dropped.
	pub async fn run(&self) -> Result<(), EngineError> {
		let seconds = self.config.storage.cleanup_interval_seconds;
		if seconds == 0 {
			return Err(EngineError::Config(
				"storage.cleanup_interval_seconds must be positive".into(),
			));
		}

		let mut interval = tokio::time::interval(Duration::from_secs(seconds));
		loop {
			interval.tick().await;
			match self.storage.cleanup_expired().await {
				Ok(count) if count > 0 => {
					tracing::debug!("Storage cleanup: removed {} expired entries", count);
				},
				Err(e) => {
					tracing::warn!("Storage cleanup failed: {}", e);
				},
				_ => {},
			}
		}
	}

	pub fn auth(&self) -> &AuthHandler {
		&self.auth_handler
	}

	pub fn directory(&self) -> &DirectoryHandler {
		&self.directory_handler
	}

	pub fn orders(&self) -> &OrderHandler {
		&self.order_handler
	}

	pub fn repairs(&self) -> &RepairHandler {
		&self.repair_handler
	}

	pub fn po_groups(&self) -> &PoGroupHandler {
		&self.po_group_handler
	}

	pub fn lookups(&self) -> &LookupHandler {
		&self.lookup_handler
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns a reference to the storage service.
	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}
}
