//! Workflow states, actions and actor roles.
//!
//! Orders and repairs share the first half of their lifecycle
//! (draft, pending, approved/rejected) and diverge at the end: an approved
//! order is paid by an admin, an approved repair is completed by a
//! technician.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
	Draft,
	Pending,
	Approved,
	Rejected,
	Paid,
}

impl OrderStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Draft => "draft",
			OrderStatus::Pending => "pending",
			OrderStatus::Approved => "approved",
			OrderStatus::Rejected => "rejected",
			OrderStatus::Paid => "paid",
		}
	}

	pub fn all() -> [Self; 5] {
		[
			Self::Draft,
			Self::Pending,
			Self::Approved,
			Self::Rejected,
			Self::Paid,
		]
	}

	/// Whether the requester may still change fields and items.
	pub fn is_editable(&self) -> bool {
		matches!(self, Self::Draft | Self::Rejected)
	}

	/// Whether the order counts as approved spend (eligible for PO grouping).
	pub fn is_approved_spend(&self) -> bool {
		matches!(self, Self::Approved | Self::Paid)
	}
}

/// Lifecycle of a repair request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
	Draft,
	Pending,
	Approved,
	Rejected,
	Completed,
}

impl RepairStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RepairStatus::Draft => "draft",
			RepairStatus::Pending => "pending",
			RepairStatus::Approved => "approved",
			RepairStatus::Rejected => "rejected",
			RepairStatus::Completed => "completed",
		}
	}

	pub fn all() -> [Self; 5] {
		[
			Self::Draft,
			Self::Pending,
			Self::Approved,
			Self::Rejected,
			Self::Completed,
		]
	}

	/// Whether the requester may still change fields and items.
	pub fn is_editable(&self) -> bool {
		matches!(self, Self::Draft | Self::Rejected)
	}
}

/// Something an actor does to move a record through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
	Submit,
	Approve,
	Reject,
	MarkPaid,
	Complete,
}

impl WorkflowAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			WorkflowAction::Submit => "submit",
			WorkflowAction::Approve => "approve",
			WorkflowAction::Reject => "reject",
			WorkflowAction::MarkPaid => "mark_paid",
			WorkflowAction::Complete => "complete",
		}
	}
}

/// The capacity in which an actor performs a workflow action.
///
/// A single user can hold several roles; the engine resolves which one
/// applies to a given record before consulting the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
	/// The user who created the record.
	Requester,
	/// An active approver whose scope covers the record.
	Approver,
	Admin,
	Technician,
}

impl ActorRole {
	pub fn as_str(&self) -> &'static str {
		match self {
			ActorRole::Requester => "requester",
			ActorRole::Approver => "approver",
			ActorRole::Admin => "admin",
			ActorRole::Technician => "technician",
		}
	}
}

macro_rules! impl_display_from_str {
	($($ty:ty),*) => {$(
		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}
	)*};
}

impl_display_from_str!(OrderStatus, RepairStatus, WorkflowAction, ActorRole);

impl FromStr for OrderStatus {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().into_iter().find(|v| v.as_str() == s).ok_or(())
	}
}

impl FromStr for RepairStatus {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().into_iter().find(|v| v.as_str() == s).ok_or(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_strings() {
		assert_eq!("paid".parse::<OrderStatus>(), Ok(OrderStatus::Paid));
		assert_eq!("completed".parse::<RepairStatus>(), Ok(RepairStatus::Completed));
		assert!("completed".parse::<OrderStatus>().is_err());
		assert_eq!(WorkflowAction::MarkPaid.to_string(), "mark_paid");
		assert_eq!(
			serde_json::to_string(&OrderStatus::Pending).unwrap(),
			"\"pending\""
		);
	}

	#[test]
	fn test_editable_states() {
		assert!(OrderStatus::Draft.is_editable());
		assert!(OrderStatus::Rejected.is_editable());
		assert!(!OrderStatus::Pending.is_editable());
		assert!(RepairStatus::Rejected.is_editable());
		assert!(!RepairStatus::Completed.is_editable());
		assert!(OrderStatus::Paid.is_approved_spend());
		assert!(!OrderStatus::Pending.is_approved_spend());
	}
}
