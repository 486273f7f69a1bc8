//! Purchase orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OrderStatus;

/// A purchase request against a vendor, optionally charged to a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
	pub id: String,
	/// Human-facing number, `ORD-YYYYMMDD-NNNN`.
	pub order_number: String,
	pub vendor_id: String,
	pub unit_id: Option<String>,
	pub po_group_id: Option<String>,
	pub description: String,
	pub status: OrderStatus,
	pub ordered_by_id: String,
	pub approved_by_id: Option<String>,
	pub approved_at: Option<DateTime<Utc>>,
	pub rejected_by_id: Option<String>,
	pub rejected_at: Option<DateTime<Utc>>,
	pub rejection_comment: Option<String>,
	pub notes: Option<String>,
	#[serde(default)]
	pub items: Vec<OrderItem>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Sum of all priced line items. Items missing a quantity or unit cost
	/// contribute nothing. Saturates at the `Decimal` range.
	pub fn total(&self) -> Decimal {
		self.items
			.iter()
			.filter_map(OrderItem::total)
			.fold(Decimal::ZERO, Decimal::saturating_add)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
	pub id: String,
	pub line_number: u32,
	pub description: String,
	pub quantity: Option<Decimal>,
	pub unit_cost: Option<Decimal>,
}

impl OrderItem {
	pub fn total(&self) -> Option<Decimal> {
		Some(self.quantity?.saturating_mul(self.unit_cost?))
	}
}
