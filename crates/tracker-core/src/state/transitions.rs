//! Transition tables for orders and repairs.
//!
//! Each table maps `(current status, action, actor role)` to the next
//! status. Anything not listed is rejected.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;
use tracker_types::{ActorRole, OrderStatus, RepairStatus, WorkflowAction};

/// Rejections produced by a transition table lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
	/// The action is not available from the current status for any role.
	#[error("Cannot {action} from status {from}")]
	InvalidTransition { from: String, action: WorkflowAction },
	/// The action is available from this status, but not to this role.
	#[error("Role {role} cannot {action}")]
	RoleNotPermitted {
		action: WorkflowAction,
		role: ActorRole,
	},
}

/// A static `(status, action, role) -> status` table.
pub struct TransitionTable<S> {
	rows: HashMap<(S, WorkflowAction, ActorRole), S>,
}

impl<S> TransitionTable<S>
where
	S: Copy + Eq + Hash + fmt::Display,
{
	fn new(rows: &[(S, WorkflowAction, ActorRole, S)]) -> Self {
		Self {
			rows: rows
				.iter()
				.map(|(from, action, role, to)| ((*from, *action, *role), *to))
				.collect(),
		}
	}

	/// Whether `action` is available from `from` to some role.
	pub fn permits(&self, from: S, action: WorkflowAction) -> bool {
		self.rows
			.keys()
			.any(|(status, a, _)| *status == from && *a == action)
	}

	/// Checks that `action` is available from `from`.
	pub fn check(&self, from: S, action: WorkflowAction) -> Result<(), TransitionError> {
		if self.permits(from, action) {
			Ok(())
		} else {
			Err(TransitionError::InvalidTransition {
				from: from.to_string(),
				action,
			})
		}
	}

	/// Resolves the status reached when `role` performs `action` on a record
	/// in status `from`.
	pub fn next(
		&self,
		from: S,
		action: WorkflowAction,
		role: ActorRole,
	) -> Result<S, TransitionError> {
		if let Some(to) = self.rows.get(&(from, action, role)) {
			return Ok(*to);
		}
		self.check(from, action)?;
		Err(TransitionError::RoleNotPermitted { action, role })
	}
}

pub static ORDER_TRANSITIONS: Lazy<TransitionTable<OrderStatus>> = Lazy::new(|| {
	use ActorRole::*;
	use OrderStatus::*;
	use WorkflowAction::*;

	TransitionTable::new(&[
		(Draft, Submit, Requester, Pending),
		(Rejected, Submit, Requester, Pending),
		(Pending, Approve, Approver, Approved),
		(Pending, Reject, Approver, Rejected),
		(Approved, MarkPaid, Admin, Paid),
	])
});

pub static REPAIR_TRANSITIONS: Lazy<TransitionTable<RepairStatus>> = Lazy::new(|| {
	use ActorRole::*;
	use RepairStatus::*;
	use WorkflowAction::*;

	TransitionTable::new(&[
		(Draft, Submit, Requester, Pending),
		(Rejected, Submit, Requester, Pending),
		(Pending, Approve, Approver, Approved),
		(Pending, Reject, Approver, Rejected),
		(Approved, Complete, Technician, Completed),
	])
});
