//! Small formatting helpers shared across crates.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fresh record id (UUID v4, hyphenated).
pub fn new_id() -> String {
	Uuid::new_v4().to_string()
}

/// Truncates an identifier for log output.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Normalizes a US phone number to its 10 digits.
///
/// Every non-digit is stripped and an 11-digit number with a leading `1`
/// loses its country code. Anything that does not end up as exactly ten
/// digits is rejected.
pub fn format_us_phone(phone: &str) -> Option<String> {
	let mut digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
	if digits.len() == 11 && digits.starts_with('1') {
		digits.remove(0);
	}
	(digits.len() == 10).then_some(digits)
}

/// Lower-cases and trims an email address for lookups and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Day prefix for human-facing record numbers, e.g. `ORD-20250114`.
pub fn day_prefix(prefix: &str, now: DateTime<Utc>) -> String {
	format!("{}-{}", prefix, now.format("%Y%m%d"))
}

/// Formats the `n`th record number of a day, e.g. `ORD-20250114-0003`.
pub fn sequence_number(day_prefix: &str, n: usize) -> String {
	format!("{}-{:04}", day_prefix, n)
}
