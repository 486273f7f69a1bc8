//! ClickSend SMS gateway backend.
//!
//! Messages are posted to the ClickSend REST API with basic authentication.
//! Every body gets a sender signature appended before it leaves the process.

use crate::{
	BulkResult, NotificationFactory, NotificationInterface, NotificationRegistry, NotifyError,
	SmsMessage,
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracker_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SecretString, ValidationError,
};

const DEFAULT_API_URL: &str = "https://rest.clicksend.com/v3/sms/send";
const DEFAULT_SOURCE: &str = "spyco-po";
const DEFAULT_SIGNATURE: &str = " -Sent by Spyco Oilfield Service";
const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Settings read from the `[notifications.implementations.clicksend]` table.
#[derive(Debug, Clone)]
pub struct ClickSendConfig {
	pub username: String,
	pub api_key: SecretString,
	pub api_url: String,
	pub source: String,
	pub signature: String,
	pub country: String,
	pub timeout: Duration,
}

impl ClickSendConfig {
	fn from_toml(config: &toml::Value) -> Result<Self, NotifyError> {
		let string = |key: &str| config.get(key).and_then(|v| v.as_str());
		let required = |key: &str| {
			string(key)
				.map(str::to_string)
				.ok_or_else(|| NotifyError::Configuration(format!("{} is required", key)))
		};

		let timeout_seconds = config
			.get("timeout_seconds")
			.and_then(|v| v.as_integer())
			.map(|v| v as u64)
			.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

		Ok(Self {
			username: required("username")?,
			api_key: SecretString::new(required("api_key")?),
			api_url: string("api_url").unwrap_or(DEFAULT_API_URL).to_string(),
			source: string("source").unwrap_or(DEFAULT_SOURCE).to_string(),
			signature: string("signature").unwrap_or(DEFAULT_SIGNATURE).to_string(),
			country: string("country").unwrap_or(DEFAULT_COUNTRY).to_string(),
			timeout: Duration::from_secs(timeout_seconds),
		})
	}
}

#[derive(Debug, Serialize, PartialEq)]
struct OutgoingMessage<'a> {
	to: &'a str,
	body: String,
	source: &'a str,
	country: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct SendPayload<'a> {
	messages: Vec<OutgoingMessage<'a>>,
}

/// Builds the request body, skipping messages without a number or text.
fn build_payload<'a>(config: &'a ClickSendConfig, messages: &'a [SmsMessage]) -> SendPayload<'a> {
	SendPayload {
		messages: messages
			.iter()
			.filter(|m| !m.to.is_empty() && !m.body.is_empty())
			.map(|m| OutgoingMessage {
				to: &m.to,
				body: format!("{}{}", m.body, config.signature),
				source: &config.source,
				country: &config.country,
			})
			.collect(),
	}
}

fn response_code(response: &Value) -> &str {
	response
		.get("response_code")
		.and_then(Value::as_str)
		.unwrap_or("UNKNOWN")
}

/// Interprets the gateway's answer to a bulk send.
fn interpret_bulk(response: &Value, attempted: usize) -> Result<BulkResult, NotifyError> {
	let code = response_code(response);
	if code != "SUCCESS" {
		return Err(NotifyError::Rejected(code.to_string()));
	}
	let queued = response
		.pointer("/data/queued_count")
		.and_then(Value::as_u64)
		.map(|n| n as usize)
		.unwrap_or(0)
		.min(attempted);
	Ok(BulkResult {
		success_count: queued,
		failure_count: attempted - queued,
	})
}

/// Interprets the gateway's answer to a single send.
///
/// The top-level code must be `SUCCESS`; when the per-message list is present
/// its first entry must be accepted too.
fn interpret_single(response: &Value) -> Result<(), NotifyError> {
	let code = response_code(response);
	if code != "SUCCESS" {
		return Err(NotifyError::Rejected(code.to_string()));
	}
	if let Some(first) = response
		.pointer("/data/messages")
		.and_then(Value::as_array)
		.and_then(|messages| messages.first())
	{
		let status = first
			.get("status")
			.and_then(Value::as_str)
			.unwrap_or("UNKNOWN");
		if status != "SUCCESS" {
			return Err(NotifyError::Rejected(status.to_string()));
		}
	}
	Ok(())
}

/// SMS delivery through ClickSend.
pub struct ClickSendNotifier {
	config: ClickSendConfig,
	client: reqwest::Client,
}

impl ClickSendNotifier {
	pub fn new(config: ClickSendConfig) -> Result<Self, NotifyError> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|e| NotifyError::Configuration(format!("HTTP client: {}", e)))?;
		Ok(Self { config, client })
	}

	async fn post(&self, payload: &SendPayload<'_>) -> Result<Value, NotifyError> {
		let response = self
			.client
			.post(&self.config.api_url)
			.basic_auth(&self.config.username, Some(self.config.api_key.expose_secret()))
			.json(payload)
			.send()
			.await
			.map_err(|e| NotifyError::Network(e.to_string()))?;

		let status = response.status();
		let body: Value = response
			.json()
			.await
			.map_err(|e| NotifyError::Network(format!("invalid response ({}): {}", status, e)))?;
		tracing::debug!(%status, code = response_code(&body), "ClickSend response");
		Ok(body)
	}
}

#[async_trait]
impl NotificationInterface for ClickSendNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ClickSendSchema)
	}

	async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
		let messages = std::slice::from_ref(message);
		let payload = build_payload(&self.config, messages);
		if payload.messages.is_empty() {
			return Err(NotifyError::Rejected("empty recipient or message".into()));
		}
		let response = self.post(&payload).await?;
		interpret_single(&response)
	}

	async fn send_bulk(&self, messages: &[SmsMessage]) -> Result<BulkResult, NotifyError> {
		let payload = build_payload(&self.config, messages);
		if payload.messages.is_empty() {
			return Ok(BulkResult::default());
		}
		let attempted = payload.messages.len();
		let response = self.post(&payload).await?;
		interpret_bulk(&response, attempted)
	}
}

/// Configuration schema for the ClickSend backend.
pub struct ClickSendSchema;

impl ConfigSchema for ClickSendSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let non_empty = |v: &toml::Value| match v.as_str() {
			Some(s) if !s.trim().is_empty() => Ok(()),
			_ => Err("must not be empty".to_string()),
		};
		let schema = Schema::new(
			vec![
				Field::new("username", FieldType::String).with_validator(non_empty),
				Field::new("api_key", FieldType::String).with_validator(non_empty),
			],
			vec![
				Field::new("api_url", FieldType::String),
				Field::new("source", FieldType::String),
				Field::new("signature", FieldType::String),
				Field::new("country", FieldType::String),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a ClickSend backend from configuration.
pub fn create_notifier(
	config: &toml::Value,
) -> Result<Box<dyn NotificationInterface>, NotifyError> {
	ClickSendSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;
	Ok(Box::new(ClickSendNotifier::new(ClickSendConfig::from_toml(
		config,
	)?)?))
}

/// Registry for the ClickSend implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "clicksend";
	type Factory = NotificationFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotificationRegistry for Registry {}
