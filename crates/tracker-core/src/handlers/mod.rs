//! Request handlers for the tracker's operations.
//!
//! Each handler owns one area of the API surface: sessions, admin reference
//! data, orders, repairs, PO groups and the lookups used by entry forms.
//! Handlers that mutate records which carry unique fields or generated
//! numbers hold the engine's write lock for the check-then-write span.

pub mod auth;
pub mod directory;
pub mod lookup;
pub mod order;
pub mod po_group;
pub mod repair;

pub use auth::{AuthHandler, LoginOutcome};
pub use directory::DirectoryHandler;
pub use lookup::LookupHandler;
pub use order::OrderHandler;
pub use po_group::PoGroupHandler;
pub use repair::RepairHandler;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracker_types::{day_prefix, sequence_number};

/// Serializes check-then-write sequences across handlers.
pub type WriteLock = Arc<Mutex<()>>;

/// Allocates the next `PREFIX-YYYYMMDD-NNNN` number for `now`.
///
/// The counter starts at the number of records already carrying today's
/// prefix and skips values that are taken, so numbers freed by deleted
/// drafts are not handed out twice.
pub(crate) fn next_number<'a>(
	prefix: &str,
	existing: impl IntoIterator<Item = &'a str>,
	now: DateTime<Utc>,
) -> String {
	let day = day_prefix(prefix, now);
	let taken: HashSet<&str> = existing
		.into_iter()
		.filter(|n| n.starts_with(&day))
		.collect();

	let mut n = taken.len() + 1;
	loop {
		let candidate = sequence_number(&day, n);
		if !taken.contains(candidate.as_str()) {
			return candidate;
		}
		n += 1;
	}
}

/// Trims an optional text field, mapping blank input to `None`.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}
