//! Approver routing.
//!
//! An order goes to every active approver whose scope covers the
//! requester's department; a repair goes to every active approver whose
//! scope covers the Repairs department. Global approvers cover everything.

use tracker_types::{Approver, REPAIRS_DEPARTMENT_ID};

/// Active approvers covering `department_id`. A requester without a
/// department is covered by global approvers only.
pub fn eligible_approvers<'a>(
	approvers: &'a [Approver],
	department_id: Option<&str>,
) -> Vec<&'a Approver> {
	approvers
		.iter()
		.filter(|a| a.is_active && a.can_approve_for_department(department_id))
		.collect()
}

/// Active approvers covering repairs.
pub fn repair_approvers(approvers: &[Approver]) -> Vec<&Approver> {
	eligible_approvers(approvers, Some(REPAIRS_DEPARTMENT_ID))
}
