//! Core engine for the fleet purchase-order and repair tracker.
//!
//! This crate holds the business rules: who may see, edit and move orders
//! and repairs through their workflows, how requests are routed to
//! approvers, how PO groups aggregate approved spend, and how sessions are
//! issued and checked. The HTTP layer in `tracker-service` is a thin
//! translation over the handlers exposed by [`TrackerEngine`].

use thiserror::Error;
use tracker_storage::StorageError;

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod routing;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

pub use builder::{BuilderError, TrackerBuilder, TrackerFactories};
pub use engine::context::{Actor, Snapshot};
pub use engine::{EngineError, TrackerEngine};
pub use state::{StateError, TransitionError};

/// Errors returned by tracker operations.
///
/// The message of every client-facing variant is shown to the user as-is.
#[derive(Debug, Error)]
pub enum TrackerError {
	/// Missing or invalid input (400).
	#[error("{0}")]
	Validation(String),
	/// A unique field collides with an existing record (400).
	#[error("{0}")]
	Conflict(String),
	/// Missing, expired or revoked credentials (401).
	#[error("{0}")]
	Unauthorized(String),
	/// Authenticated but not allowed (403).
	#[error("{0}")]
	Forbidden(String),
	/// The addressed record does not exist (404).
	#[error("{0}")]
	NotFound(String),
	/// The workflow does not allow this action (400 or 403).
	#[error(transparent)]
	Transition(#[from] TransitionError),
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl TrackerError {
	/// HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			TrackerError::Validation(_) | TrackerError::Conflict(_) => 400,
			TrackerError::Transition(TransitionError::InvalidTransition { .. }) => 400,
			TrackerError::Transition(TransitionError::RoleNotPermitted { .. }) => 403,
			TrackerError::Unauthorized(_) => 401,
			TrackerError::Forbidden(_) => 403,
			TrackerError::NotFound(_) => 404,
			TrackerError::Storage(_) | TrackerError::Internal(_) => 500,
		}
	}

	/// Machine-readable error code.
	pub fn error_code(&self) -> &'static str {
		match self {
			TrackerError::Validation(_) => "VALIDATION_ERROR",
			TrackerError::Conflict(_) => "CONFLICT",
			TrackerError::Unauthorized(_) => "UNAUTHORIZED",
			TrackerError::Forbidden(_) => "FORBIDDEN",
			TrackerError::NotFound(_) => "NOT_FOUND",
			TrackerError::Transition(_) => "INVALID_TRANSITION",
			TrackerError::Storage(_) => "STORAGE_ERROR",
			TrackerError::Internal(_) => "INTERNAL_ERROR",
		}
	}

	/// Whether the message may be shown to clients verbatim.
	pub fn is_client_error(&self) -> bool {
		self.status_code() < 500
	}
}

impl From<StateError> for TrackerError {
	fn from(err: StateError) -> Self {
		match err {
			StateError::Storage(e) => TrackerError::Storage(e),
			StateError::Transition(e) => TrackerError::Transition(e),
		}
	}
}

pub(crate) fn validation(message: impl Into<String>) -> TrackerError {
	TrackerError::Validation(message.into())
}

pub(crate) fn forbidden(message: impl Into<String>) -> TrackerError {
	TrackerError::Forbidden(message.into())
}

pub(crate) fn not_found(message: impl Into<String>) -> TrackerError {
	TrackerError::NotFound(message.into())
}

/// Returns the trimmed value when it is present and not blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}
