//! Redacting string wrapper for credentials held in configuration.
//!
//! Session signing secrets, SMS gateway API keys and bootstrap passwords are
//! loaded from TOML and kept in memory for the process lifetime. `SecretString`
//! zeroes its buffer on drop and never prints the value through `Debug`,
//! `Display` or `Serialize`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// A string that is zeroed on drop and redacted in every textual rendering.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Wraps an owned string.
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret string as a string slice.
	///
	/// Callers must not log or persist the returned value.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Exposes the secret as raw bytes, e.g. for use as a MAC key.
	pub fn expose_bytes(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Returns the length of the secret string.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if the secret string is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString(***REDACTED***)")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "***REDACTED***")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Config dumps must never round-trip the real value.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str("***REDACTED***")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_token_secret_is_redacted() {
		let secret = SecretString::from("session-signing-key");
		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", secret), "***REDACTED***");
		assert_eq!(
			serde_json::to_string(&secret).unwrap(),
			"\"***REDACTED***\""
		);
	}

	#[test]
	fn test_deserialize_keeps_value() {
		#[derive(Deserialize)]
		struct Auth {
			token_secret: SecretString,
		}

		let auth: Auth = toml::from_str("token_secret = \"abc123\"").unwrap();
		assert_eq!(auth.token_secret.expose_secret(), "abc123");
		assert_eq!(auth.token_secret.expose_bytes(), b"abc123");
		assert_eq!(auth.token_secret.len(), 6);
	}

	#[test]
	fn test_equality() {
		assert_eq!(SecretString::from("a"), SecretString::from("a"));
		assert_ne!(SecretString::from("a"), SecretString::from("b"));
		assert!(SecretString::from("").is_empty());
	}
}
