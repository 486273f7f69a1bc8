//! Notification backend that only writes messages to the log.

use crate::{
	BulkResult, NotificationFactory, NotificationInterface, NotificationRegistry, NotifyError,
	SmsMessage,
};
use async_trait::async_trait;
use tracker_types::{truncate_id, ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// Logs each message at info level instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl NotificationInterface for LogNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LogNotifierSchema)
	}

	async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
		tracing::info!(to = %truncate_id(&message.to), body = %message.body, "SMS");
		Ok(())
	}

	async fn send_bulk(&self, messages: &[SmsMessage]) -> Result<BulkResult, NotifyError> {
		for message in messages {
			self.send(message).await?;
		}
		Ok(BulkResult {
			success_count: messages.len(),
			failure_count: 0,
		})
	}
}

pub struct LogNotifierSchema;

impl ConfigSchema for LogNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_notifier(
	config: &toml::Value,
) -> Result<Box<dyn NotificationInterface>, NotifyError> {
	LogNotifierSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;
	Ok(Box::new(LogNotifier))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = NotificationFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotificationRegistry for Registry {}
