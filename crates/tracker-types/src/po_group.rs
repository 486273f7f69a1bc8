//! Accounting purchase-order numbers that group approved orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A PO number under which approved or paid orders are paid together.
///
/// Membership is stored on the order (`Order::po_group_id`); the group
/// itself only carries the number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoGroup {
	pub id: String,
	pub po_number: String,
	pub created_by_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
