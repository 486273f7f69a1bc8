//! Lifecycle management for the tracker engine.
//!
//! Startup seeds the records the workflows depend on: the fixed Repairs
//! department that repair approvals route through, and the configured
//! bootstrap admin.

use super::{EngineError, TrackerEngine};

impl TrackerEngine {
	/// Performs any initialization required before serving requests.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		tracing::info!(tracker_id = %self.config.tracker.id, "Initializing tracker engine");

		let created = self
			.directory_handler
			.ensure_repairs_department()
			.await
			.map_err(|e| EngineError::Service(format!("Failed to seed Repairs department: {}", e)))?;
		if created {
			tracing::info!("Created Repairs department");
		}

		if let Some(bootstrap) = &self.config.bootstrap {
			let created = self
				.directory_handler
				.ensure_admin(bootstrap)
				.await
				.map_err(|e| EngineError::Service(format!("Failed to seed admin: {}", e)))?;
			if created {
				tracing::info!(email = %bootstrap.admin_email, "Created bootstrap admin");
			} else {
				tracing::debug!("Bootstrap admin already present");
			}
		}

		Ok(())
	}

	/// Performs cleanup operations
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down tracker engine");
		let removed = self
			.storage
			.cleanup_expired()
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;
		tracing::debug!(removed, "Final storage cleanup");
		Ok(())
	}
}
