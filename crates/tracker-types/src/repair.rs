//! Repair requests against units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RepairStatus;

/// A maintenance request for a unit.
///
/// Repairs always route to approvers covering the repairs department,
/// independent of the requester's own department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repair {
	pub id: String,
	/// Human-facing number, `REP-YYYYMMDD-NNNN`.
	pub repair_number: String,
	pub unit_id: String,
	pub description: String,
	pub status: RepairStatus,
	pub requested_by_id: String,
	pub approved_by_id: Option<String>,
	pub approved_at: Option<DateTime<Utc>>,
	pub rejected_by_id: Option<String>,
	pub rejected_at: Option<DateTime<Utc>>,
	pub rejection_comment: Option<String>,
	pub completed_by_id: Option<String>,
	pub completed_at: Option<DateTime<Utc>>,
	pub notes: Option<String>,
	#[serde(default)]
	pub items: Vec<RepairItem>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A descriptive line of work; repairs carry no cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairItem {
	pub id: String,
	pub line_number: u32,
	pub description: String,
}
