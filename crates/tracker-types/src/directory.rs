//! Reference data maintained by admins: departments, users, vendors, units,
//! approvers and technicians.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Fixed id of the department every repair is routed through.
pub const REPAIRS_DEPARTMENT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Display name of the seeded repairs department.
pub const REPAIRS_DEPARTMENT_NAME: &str = "Repairs";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
	pub id: String,
	pub name: String,
	pub description: Option<String>,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// An account that can sign in.
///
/// The stored record carries the bcrypt hash; API responses are built from
/// [`crate::UserView`] which never includes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
	pub id: String,
	pub email: String,
	pub password_hash: String,
	pub first_name: String,
	pub last_name: String,
	pub phone: Option<String>,
	pub department_id: Option<String>,
	pub job_title: Option<String>,
	pub is_admin: bool,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl User {
	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
	pub id: String,
	pub name: String,
	pub contact_info: Option<String>,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Kind of unit an order or repair is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
	Vehicle,
	Trailer,
	Equipment,
	Location,
	#[default]
	Other,
}

impl UnitType {
	pub fn as_str(&self) -> &'static str {
		match self {
			UnitType::Vehicle => "vehicle",
			UnitType::Trailer => "trailer",
			UnitType::Equipment => "equipment",
			UnitType::Location => "location",
			UnitType::Other => "other",
		}
	}

	pub fn all() -> [Self; 5] {
		[
			Self::Vehicle,
			Self::Trailer,
			Self::Equipment,
			Self::Location,
			Self::Other,
		]
	}
}

impl fmt::Display for UnitType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for UnitType {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().into_iter().find(|t| t.as_str() == s).ok_or(())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
	pub id: String,
	pub unit_number: String,
	pub description: Option<String>,
	#[serde(default)]
	pub unit_type: UnitType,
	pub department_id: Option<String>,
	pub is_active: bool,
	pub created_by_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Grants a user the right to approve or reject requests.
///
/// An approver with no departments is global and covers every department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Approver {
	pub id: String,
	pub user_id: String,
	pub is_active: bool,
	pub created_by_id: Option<String>,
	#[serde(default)]
	pub department_ids: BTreeSet<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Approver {
	pub fn is_global_approver(&self) -> bool {
		self.department_ids.is_empty()
	}

	/// Whether this approver's scope includes `department_id`.
	///
	/// `None` stands for a requester without a department, which only a
	/// global approver covers.
	pub fn can_approve_for_department(&self, department_id: Option<&str>) -> bool {
		if self.is_global_approver() {
			return true;
		}
		department_id.is_some_and(|d| self.department_ids.contains(d))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Technician {
	pub id: String,
	pub user_id: String,
	pub is_active: bool,
	pub created_by_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
