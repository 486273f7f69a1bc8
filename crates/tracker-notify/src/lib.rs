//! SMS notification module for the fleet tracker.
//!
//! Workflow transitions notify the people who have to act next: approvers
//! when a request is submitted, admins or technicians when it is approved,
//! and the requester when it is paid or completed. Delivery goes through a
//! pluggable [`NotificationInterface`] backend.
//!
//! Notification failures never fail the workflow operation that triggered
//! them; they are logged and dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracker_types::{ConfigSchema, ImplementationRegistry, Order, Repair, User};

/// Re-export implementations
pub mod implementations {
	pub mod clicksend;
	pub mod log;
	pub mod memory;
}

/// Errors that can occur while sending notifications.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs during network communication with the gateway.
	#[error("Network error: {0}")]
	Network(String),
	/// The gateway answered but did not accept the message.
	#[error("Rejected by gateway: {0}")]
	Rejected(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A single text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
	/// Destination number, 10-digit US format.
	pub to: String,
	pub body: String,
}

impl SmsMessage {
	pub fn new(to: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			to: to.into(),
			body: body.into(),
		}
	}
}

/// Outcome of a bulk send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkResult {
	pub success_count: usize,
	pub failure_count: usize,
}

/// Trait defining the interface for SMS gateways.
#[async_trait]
pub trait NotificationInterface: Send + Sync {
	/// Returns the configuration schema for this backend.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Sends one message. `Ok` means the gateway accepted it.
	async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError>;

	/// Sends several messages in one request where the gateway allows it.
	async fn send_bulk(&self, messages: &[SmsMessage]) -> Result<BulkResult, NotifyError>;
}

/// Type alias for notification factory functions.
pub type NotificationFactory =
	fn(&toml::Value) -> Result<Box<dyn NotificationInterface>, NotifyError>;

/// Registry trait for notification implementations.
pub trait NotificationRegistry: ImplementationRegistry<Factory = NotificationFactory> {}

/// Get all registered notification implementations.
pub fn get_all_implementations() -> Vec<(&'static str, NotificationFactory)> {
	use implementations::{clicksend, log, memory};

	vec![
		(clicksend::Registry::NAME, clicksend::Registry::factory()),
		(log::Registry::NAME, log::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Composes workflow notifications and hands them to the backend.
pub struct NotificationService {
	backend: Box<dyn NotificationInterface>,
	/// Base URL of the web client, without trailing slash.
	client_url: String,
}

impl NotificationService {
	pub fn new(backend: Box<dyn NotificationInterface>, client_url: impl Into<String>) -> Self {
		Self {
			backend,
			client_url: client_url.into().trim_end_matches('/').to_string(),
		}
	}

	fn order_link(&self, order: &Order) -> String {
		format!("{}/orders/{}", self.client_url, order.id)
	}

	fn repair_link(&self, repair: &Repair) -> String {
		format!("{}/repairs/{}", self.client_url, repair.id)
	}

	/// One message per recipient with a phone number on file.
	fn to_each<'a>(
		recipients: impl IntoIterator<Item = &'a User>,
		body: &str,
	) -> Vec<SmsMessage> {
		recipients
			.into_iter()
			.filter_map(|user| user.phone.as_deref())
			.filter(|phone| !phone.is_empty())
			.map(|phone| SmsMessage::new(phone, body))
			.collect()
	}

	async fn dispatch_bulk(&self, event: &'static str, messages: Vec<SmsMessage>) {
		if messages.is_empty() {
			tracing::debug!(event, "No recipients with a phone number");
			return;
		}
		match self.backend.send_bulk(&messages).await {
			Ok(result) if result.failure_count == 0 => {
				tracing::debug!(event, sent = result.success_count, "Notifications sent");
			},
			Ok(result) => {
				tracing::warn!(
					event,
					sent = result.success_count,
					failed = result.failure_count,
					"Some notifications were not delivered"
				);
			},
			Err(e) => tracing::warn!(event, error = %e, "Failed to send notifications"),
		}
	}

	async fn dispatch_one(&self, event: &'static str, recipient: &User, body: String) {
		let Some(phone) = recipient.phone.as_deref().filter(|p| !p.is_empty()) else {
			tracing::debug!(event, "Recipient has no phone number");
			return;
		};
		if let Err(e) = self.backend.send(&SmsMessage::new(phone, body)).await {
			tracing::warn!(event, error = %e, "Failed to send notification");
		}
	}

	/// Tells eligible approvers that an order awaits them.
	pub async fn order_pending(&self, order: &Order, approvers: &[User], submitter_name: &str) {
		let body = format!(
			"New order {} pending approval from {}. {}",
			order.order_number,
			submitter_name,
			self.order_link(order)
		);
		self.dispatch_bulk("order_pending", Self::to_each(approvers, &body))
			.await;
	}

	/// Tells eligible approvers that a repair awaits them.
	pub async fn repair_pending(&self, repair: &Repair, approvers: &[User], submitter_name: &str) {
		let body = format!(
			"New repair {} pending approval from {}. {}",
			repair.repair_number,
			submitter_name,
			self.repair_link(repair)
		);
		self.dispatch_bulk("repair_pending", Self::to_each(approvers, &body))
			.await;
	}

	/// Tells admins an order is approved and can be paid.
	pub async fn order_approved(&self, order: &Order, admins: &[User]) {
		let body = format!(
			"Order {} has been approved. {}",
			order.order_number,
			self.order_link(order)
		);
		self.dispatch_bulk("order_approved", Self::to_each(admins, &body))
			.await;
	}

	/// Tells technicians a repair is approved and ready to be worked.
	pub async fn repair_approved(&self, repair: &Repair, technicians: &[User]) {
		let body = format!(
			"Repair {} approved and ready for completion. {}",
			repair.repair_number,
			self.repair_link(repair)
		);
		self.dispatch_bulk("repair_approved", Self::to_each(technicians, &body))
			.await;
	}

	/// Tells the requester their order has been paid.
	pub async fn order_paid(
		&self,
		order: &Order,
		requester: &User,
		vendor_name: Option<&str>,
		po_number: Option<&str>,
	) {
		let body = format!(
			"Your order from {} has been paid. PO#: {}. {}",
			vendor_name.unwrap_or("Unknown Vendor"),
			po_number.unwrap_or("N/A"),
			self.order_link(order)
		);
		self.dispatch_one("order_paid", requester, body).await;
	}

	/// Tells the requester their repair is done.
	pub async fn repair_completed(&self, repair: &Repair, requester: &User) {
		let body = format!(
			"Your repair {} has been marked complete. {}",
			repair.repair_number,
			self.repair_link(repair)
		);
		self.dispatch_one("repair_completed", requester, body).await;
	}
}
