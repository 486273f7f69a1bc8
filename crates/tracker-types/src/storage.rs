//! Storage namespaces for the tracker's persisted records.

use std::str::FromStr;

/// Namespaces under which each record kind is stored.
///
/// Keys are formed as `"{namespace}:{id}"`, so a namespace prefix scan lists
/// every record of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	Users,
	Departments,
	Vendors,
	Units,
	Approvers,
	Technicians,
	Orders,
	Repairs,
	PoGroups,
	/// Session nonces invalidated by logout; stored with a TTL.
	RevokedSessions,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Users => "users",
			StorageKey::Departments => "departments",
			StorageKey::Vendors => "vendors",
			StorageKey::Units => "units",
			StorageKey::Approvers => "approvers",
			StorageKey::Technicians => "technicians",
			StorageKey::Orders => "orders",
			StorageKey::Repairs => "repairs",
			StorageKey::PoGroups => "po_groups",
			StorageKey::RevokedSessions => "revoked_sessions",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Users,
			Self::Departments,
			Self::Vendors,
			Self::Units,
			Self::Approvers,
			Self::Technicians,
			Self::Orders,
			Self::Repairs,
			Self::PoGroups,
			Self::RevokedSessions,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().find(|k| k.as_str() == s).ok_or(())
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
