//! Registry trait for self-registering implementations.
//!
//! Pluggable backends (storage engines, SMS gateways) expose a `Registry`
//! marker type that names the configuration key they answer to and hands out
//! their factory function.

/// Base trait for implementation registries.
///
/// Each pluggable module provides a `Registry` struct implementing this trait,
/// so the service can build its factory maps from `get_all_implementations()`
/// without hard-coding names.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// Matches the table key in TOML, for example `memory` for
	/// `storage.implementations.memory` or `clicksend` for
	/// `notifications.implementations.clicksend`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Returns the factory function for this implementation.
	fn factory() -> Self::Factory;
}
