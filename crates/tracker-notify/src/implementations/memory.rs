//! In-memory notification backend.
//!
//! Records every accepted message so tests can assert on what would have been
//! texted. Clones share the same outbox.

use crate::{
	BulkResult, NotificationFactory, NotificationInterface, NotificationRegistry, NotifyError,
	SmsMessage,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracker_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

#[derive(Clone, Default)]
pub struct MemoryNotifier {
	outbox: Arc<Mutex<Vec<SmsMessage>>>,
	fail: bool,
}

impl MemoryNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	/// A notifier whose gateway rejects everything.
	pub fn failing() -> Self {
		Self {
			fail: true,
			..Self::default()
		}
	}

	/// Messages accepted so far, in send order.
	pub async fn sent(&self) -> Vec<SmsMessage> {
		self.outbox.lock().await.clone()
	}

	pub async fn clear(&self) {
		self.outbox.lock().await.clear();
	}
}

#[async_trait]
impl NotificationInterface for MemoryNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryNotifierSchema)
	}

	async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
		if self.fail {
			return Err(NotifyError::Rejected("memory notifier set to fail".into()));
		}
		self.outbox.lock().await.push(message.clone());
		Ok(())
	}

	async fn send_bulk(&self, messages: &[SmsMessage]) -> Result<BulkResult, NotifyError> {
		if self.fail {
			return Err(NotifyError::Rejected("memory notifier set to fail".into()));
		}
		self.outbox.lock().await.extend_from_slice(messages);
		Ok(BulkResult {
			success_count: messages.len(),
			failure_count: 0,
		})
	}
}

pub struct MemoryNotifierSchema;

impl ConfigSchema for MemoryNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("fail", FieldType::Boolean)]).validate(config)
	}
}

/// Factory function to create a memory notifier from configuration.
///
/// `fail = true` makes every send error out.
pub fn create_notifier(
	config: &toml::Value,
) -> Result<Box<dyn NotificationInterface>, NotifyError> {
	MemoryNotifierSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;
	let fail = config
		.get("fail")
		.and_then(|v| v.as_bool())
		.unwrap_or(false);
	Ok(Box::new(if fail {
		MemoryNotifier::failing()
	} else {
		MemoryNotifier::new()
	}))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = NotificationFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotificationRegistry for Registry {}
