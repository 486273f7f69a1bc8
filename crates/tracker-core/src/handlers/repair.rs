//! Repair request handler.
//!
//! Repairs follow the order workflow up to approval, but route to the
//! approvers covering the Repairs department and end with a technician
//! marking the work complete.

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use tracker_notify::NotificationService;
use tracker_storage::StorageService;
use tracker_types::{
	new_id, truncate_id, ActorRole, ApproverView, CreateRepairRequest, MessageResponse,
	RejectRequest, Repair, RepairActionResponse, RepairFilter, RepairItem, RepairItemInput,
	RepairStatus, RepairView, StorageKey, UpdateRepairRequest, WorkflowAction,
};

use super::{clean_optional, next_number, WriteLock};
use crate::engine::context::{Actor, Snapshot};
use crate::routing::repair_approvers;
use crate::state::{RepairStateMachine, REPAIR_TRANSITIONS};
use crate::{forbidden, non_blank, not_found, validation, TrackerError};

const REPAIR_PREFIX: &str = "REP";

fn repair_items(inputs: Vec<RepairItemInput>) -> Vec<RepairItem> {
	inputs
		.into_iter()
		.enumerate()
		.filter_map(|(idx, input)| {
			let description = input.description.filter(|d| !d.trim().is_empty())?;
			Some(RepairItem {
				id: new_id(),
				line_number: idx as u32 + 1,
				description,
			})
		})
		.collect()
}

pub struct RepairHandler {
	storage: Arc<StorageService>,
	notifications: Arc<NotificationService>,
	state_machine: Arc<RepairStateMachine>,
	lock: WriteLock,
}

impl RepairHandler {
	pub fn new(
		storage: Arc<StorageService>,
		notifications: Arc<NotificationService>,
		state_machine: Arc<RepairStateMachine>,
		lock: WriteLock,
	) -> Self {
		Self {
			storage,
			notifications,
			state_machine,
			lock,
		}
	}

	async fn snapshot(&self) -> Result<Snapshot, TrackerError> {
		Ok(Snapshot::load(&self.storage).await?)
	}

	async fn load(&self, id: &str) -> Result<Repair, TrackerError> {
		self.state_machine
			.get(id)
			.await?
			.ok_or_else(|| not_found("Repair not found"))
	}

	async fn ensure_unit(&self, unit_id: &str) -> Result<(), TrackerError> {
		if self.storage.exists(StorageKey::Units, unit_id).await? {
			Ok(())
		} else {
			Err(not_found("Unit not found"))
		}
	}

	fn views(snapshot: &Snapshot, mut repairs: Vec<Repair>) -> Vec<RepairView> {
		repairs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		repairs.iter().map(|r| snapshot.repair_view(r)).collect()
	}

	/// Whether the actor oversees repairs in general.
	fn oversees_repairs(actor: &Actor) -> bool {
		actor.is_admin() || actor.covers_repairs() || actor.is_technician()
	}

	/// The caller's own repairs plus repairs waiting on them: pending ones
	/// for repair approvers, approved ones for technicians.
	pub async fn list_own(&self, actor: &Actor) -> Result<Vec<RepairView>, TrackerError> {
		let snapshot = self.snapshot().await?;
		let repairs = self
			.state_machine
			.all()
			.await?
			.into_iter()
			.filter(|r| {
				r.requested_by_id == actor.id()
					|| (r.status == RepairStatus::Pending && actor.covers_repairs())
					|| (r.status == RepairStatus::Approved && actor.is_technician())
			})
			.collect();
		Ok(Self::views(&snapshot, repairs))
	}

	pub async fn list_all(
		&self,
		actor: &Actor,
		filter: RepairFilter,
	) -> Result<Vec<RepairView>, TrackerError> {
		if !Self::oversees_repairs(actor) {
			return Err(forbidden("Access denied"));
		}

		let status = filter
			.status
			.as_deref()
			.and_then(|s| s.parse::<RepairStatus>().ok());
		let owner_id = non_blank(filter.owner_id.as_deref());
		let unit_id = non_blank(filter.unit_id.as_deref());

		let snapshot = self.snapshot().await?;
		let repairs = self
			.state_machine
			.all()
			.await?
			.into_iter()
			.filter(|r| status.map_or(true, |s| r.status == s))
			.filter(|r| owner_id.map_or(true, |id| r.requested_by_id == id))
			.filter(|r| unit_id.map_or(true, |id| r.unit_id == id))
			.collect();
		Ok(Self::views(&snapshot, repairs))
	}

	pub async fn get(&self, actor: &Actor, id: &str) -> Result<RepairView, TrackerError> {
		let repair = self.load(id).await?;
		if repair.requested_by_id != actor.id() && !Self::oversees_repairs(actor) {
			return Err(forbidden("Access denied"));
		}
		Ok(self.snapshot().await?.repair_view(&repair))
	}

	#[instrument(skip_all, fields(user_id = %truncate_id(actor.id())))]
	pub async fn create(
		&self,
		actor: &Actor,
		request: CreateRepairRequest,
	) -> Result<RepairView, TrackerError> {
		let unit_id = non_blank(request.unit_id.as_deref())
			.ok_or_else(|| validation("Unit is required"))?
			.to_string();
		let description = non_blank(request.description.as_deref())
			.ok_or_else(|| validation("Description is required"))?
			.to_string();

		let guard = self.lock.lock().await;
		self.ensure_unit(&unit_id).await?;

		let now = Utc::now();
		let existing = self.state_machine.all().await?;
		let repair = Repair {
			id: new_id(),
			repair_number: next_number(
				REPAIR_PREFIX,
				existing.iter().map(|r| r.repair_number.as_str()),
				now,
			),
			unit_id,
			description,
			status: RepairStatus::Draft,
			requested_by_id: actor.id().to_string(),
			approved_by_id: None,
			approved_at: None,
			rejected_by_id: None,
			rejected_at: None,
			rejection_comment: None,
			completed_by_id: None,
			completed_at: None,
			notes: clean_optional(request.notes),
			items: repair_items(request.items),
			created_at: now,
			updated_at: now,
		};
		self.state_machine.store(&repair).await?;
		drop(guard);

		tracing::info!(
			repair_id = %truncate_id(&repair.id),
			repair_number = %repair.repair_number,
			"Repair created"
		);
		Ok(self.snapshot().await?.repair_view(&repair))
	}

	#[instrument(skip_all, fields(repair_id = %truncate_id(id)))]
	pub async fn update(
		&self,
		actor: &Actor,
		id: &str,
		request: UpdateRepairRequest,
	) -> Result<RepairView, TrackerError> {
		let guard = self.lock.lock().await;
		let repair = self.load(id).await?;
		if repair.requested_by_id != actor.id() {
			return Err(forbidden("Only the creator can edit this repair"));
		}
		if !repair.status.is_editable() {
			return Err(validation("Only draft or rejected repairs can be edited"));
		}

		// a repair always targets a unit, so it can be swapped but not cleared
		let unit_id = match request.unit_id.as_deref() {
			Some(raw) => {
				let unit_id = non_blank(Some(raw)).ok_or_else(|| validation("Unit is required"))?;
				self.ensure_unit(unit_id).await?;
				Some(unit_id.to_string())
			},
			None => None,
		};
		let description = match request.description.as_deref() {
			Some(d) => Some(
				non_blank(Some(d))
					.ok_or_else(|| validation("Description is required"))?
					.to_string(),
			),
			None => None,
		};

		let repair = self
			.state_machine
			.update_with(repair, |r| {
				if let Some(unit_id) = unit_id {
					r.unit_id = unit_id;
				}
				if let Some(description) = description {
					r.description = description;
				}
				if let Some(notes) = request.notes {
					r.notes = clean_optional(notes);
				}
				if let Some(items) = request.items {
					r.items = repair_items(items);
				}
			})
			.await?;
		drop(guard);

		Ok(self.snapshot().await?.repair_view(&repair))
	}

	#[instrument(skip_all, fields(repair_id = %truncate_id(id)))]
	pub async fn delete(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		let _guard = self.lock.lock().await;
		let repair = self.load(id).await?;
		if repair.requested_by_id != actor.id() && !actor.is_admin() {
			return Err(forbidden("Only the creator or admin can delete this repair"));
		}
		if repair.status != RepairStatus::Draft {
			return Err(validation("Only draft repairs can be deleted"));
		}

		self.state_machine.remove(id).await?;
		tracing::info!(repair_number = %repair.repair_number, "Repair deleted");
		Ok(MessageResponse::new("Repair deleted"))
	}

	#[instrument(skip_all, fields(repair_id = %truncate_id(id)))]
	pub async fn submit(&self, actor: &Actor, id: &str) -> Result<RepairActionResponse, TrackerError> {
		let guard = self.lock.lock().await;
		let repair = self.load(id).await?;
		if repair.requested_by_id != actor.id() {
			return Err(forbidden("Only the creator can submit this repair"));
		}
		if !REPAIR_TRANSITIONS.permits(repair.status, WorkflowAction::Submit) {
			return Err(validation("Only draft or rejected repairs can be submitted"));
		}
		if repair.items.is_empty() {
			return Err(validation("Repair must have at least one item"));
		}

		let snapshot = self.snapshot().await?;
		let approvers = repair_approvers(&snapshot.approvers);
		if approvers.is_empty() {
			return Err(validation("No approvers configured for repairs"));
		}

		let repair = self
			.state_machine
			.transition(repair, WorkflowAction::Submit, ActorRole::Requester, |_, _| {})
			.await?;
		drop(guard);
		tracing::info!(
			repair_number = %repair.repair_number,
			approvers = approvers.len(),
			"Repair submitted for approval"
		);

		self.notifications
			.repair_pending(
				&repair,
				&snapshot.approver_users(&approvers),
				&actor.user.full_name(),
			)
			.await;

		Ok(RepairActionResponse {
			message: "Repair submitted for approval".to_string(),
			repair: snapshot.repair_view(&repair),
			approvers: Some(
				approvers
					.iter()
					.map(|a| snapshot.approver_view(a, false))
					.collect(),
			),
		})
	}

	fn check_decision(
		actor: &Actor,
		repair: &Repair,
		action: WorkflowAction,
	) -> Result<(), TrackerError> {
		let (verb, done) = match action {
			WorkflowAction::Reject => ("reject", "rejected"),
			_ => ("approve", "approved"),
		};
		if repair.status != RepairStatus::Pending {
			return Err(validation(format!("Only pending repairs can be {}", done)));
		}
		if !actor.is_approver() {
			return Err(forbidden("You are not an approver"));
		}
		if !actor.covers_repairs() {
			return Err(forbidden(format!("You cannot {} repairs", verb)));
		}
		Ok(())
	}

	#[instrument(skip_all, fields(repair_id = %truncate_id(id)))]
	pub async fn approve(&self, actor: &Actor, id: &str) -> Result<RepairActionResponse, TrackerError> {
		let guard = self.lock.lock().await;
		let repair = self.load(id).await?;
		Self::check_decision(actor, &repair, WorkflowAction::Approve)?;

		let approver_id = actor.id().to_string();
		let repair = self
			.state_machine
			.transition(repair, WorkflowAction::Approve, ActorRole::Approver, |r, now| {
				r.approved_by_id = Some(approver_id);
				r.approved_at = Some(now);
			})
			.await?;
		drop(guard);
		tracing::info!(repair_number = %repair.repair_number, "Repair approved");

		let snapshot = self.snapshot().await?;
		self.notifications
			.repair_approved(&repair, &snapshot.active_technician_users())
			.await;

		Ok(RepairActionResponse {
			message: "Repair approved".to_string(),
			repair: snapshot.repair_view(&repair),
			approvers: None,
		})
	}

	#[instrument(skip_all, fields(repair_id = %truncate_id(id)))]
	pub async fn reject(
		&self,
		actor: &Actor,
		id: &str,
		request: RejectRequest,
	) -> Result<RepairActionResponse, TrackerError> {
		let guard = self.lock.lock().await;
		let repair = self.load(id).await?;
		Self::check_decision(actor, &repair, WorkflowAction::Reject)?;

		let approver_id = actor.id().to_string();
		let comment = request.comment.unwrap_or_default();
		let repair = self
			.state_machine
			.transition(repair, WorkflowAction::Reject, ActorRole::Approver, |r, now| {
				r.rejected_by_id = Some(approver_id);
				r.rejected_at = Some(now);
				r.rejection_comment = Some(comment);
			})
			.await?;
		drop(guard);
		tracing::info!(repair_number = %repair.repair_number, "Repair rejected");

		Ok(RepairActionResponse {
			message: "Repair rejected".to_string(),
			repair: self.snapshot().await?.repair_view(&repair),
			approvers: None,
		})
	}

	pub async fn approvers(&self, _actor: &Actor, id: &str) -> Result<Vec<ApproverView>, TrackerError> {
		self.load(id).await?;
		let snapshot = self.snapshot().await?;
		Ok(repair_approvers(&snapshot.approvers)
			.into_iter()
			.map(|a| snapshot.approver_view(a, false))
			.collect())
	}

	/// Closes out an approved repair and tells the requester.
	#[instrument(skip_all, fields(repair_id = %truncate_id(id)))]
	pub async fn complete(&self, actor: &Actor, id: &str) -> Result<RepairActionResponse, TrackerError> {
		if !actor.is_technician() {
			return Err(forbidden("Only technicians can mark repairs as completed"));
		}

		let guard = self.lock.lock().await;
		let repair = self.load(id).await?;
		if repair.status != RepairStatus::Approved {
			return Err(validation("Only approved repairs can be marked as completed"));
		}

		let technician_id = actor.id().to_string();
		let repair = self
			.state_machine
			.transition(repair, WorkflowAction::Complete, ActorRole::Technician, |r, now| {
				r.completed_by_id = Some(technician_id);
				r.completed_at = Some(now);
			})
			.await?;
		drop(guard);
		tracing::info!(repair_number = %repair.repair_number, "Repair marked as completed");

		let snapshot = self.snapshot().await?;
		if let Some(requester) = snapshot.users.get(&repair.requested_by_id) {
			self.notifications.repair_completed(&repair, requester).await;
		}

		Ok(RepairActionResponse {
			message: "Repair marked as completed".to_string(),
			repair: snapshot.repair_view(&repair),
			approvers: None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::Harness;
	use tracker_types::REPAIRS_DEPARTMENT_ID;

	fn work(description: &str) -> RepairItemInput {
		RepairItemInput {
			description: Some(description.into()),
		}
	}

	fn new_repair(unit_id: &str) -> CreateRepairRequest {
		CreateRepairRequest {
			unit_id: Some(unit_id.into()),
			description: Some("Grinding noise".into()),
			items: vec![work("Inspect front brakes")],
			..Default::default()
		}
	}

	struct Fixture {
		h: Harness,
		requester: Actor,
		approver: Actor,
		technician: Actor,
		unit_id: String,
	}

	async fn fixture() -> Fixture {
		let h = Harness::new().await;
		let shop = h.department("Shop").await;
		let requester = h.user("driver@example.com", Some(&shop.id)).await;
		let approver = h.user("fleet-boss@example.com", None).await;
		h.make_approver(approver.id(), &[REPAIRS_DEPARTMENT_ID]).await;
		let approver = h.actor(approver.id()).await;
		let technician = h.user("mechanic@example.com", None).await;
		h.make_technician(technician.id()).await;
		let technician = h.actor(technician.id()).await;
		let unit = h.unit("TRK-12").await;
		Fixture {
			h,
			requester,
			approver,
			technician,
			unit_id: unit.id,
		}
	}

	#[tokio::test]
	async fn test_create_requires_unit_and_description() {
		let f = fixture().await;
		let repairs = f.h.engine.repairs();

		let err = repairs
			.create(&f.requester, CreateRepairRequest::default())
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Unit is required");

		let err = repairs
			.create(
				&f.requester,
				CreateRepairRequest {
					description: Some(" ".into()),
					..new_repair(&f.unit_id)
				},
			)
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Description is required");

		let err = repairs
			.create(&f.requester, new_repair("missing"))
			.await
			.unwrap_err();
		assert_eq!(err.status_code(), 404);
		assert_eq!(err.to_string(), "Unit not found");

		let repair = repairs
			.create(
				&f.requester,
				CreateRepairRequest {
					items: vec![work("Inspect"), RepairItemInput::default(), work("Replace pads")],
					..new_repair(&f.unit_id)
				},
			)
			.await
			.unwrap();
		let day = Utc::now().format("%Y%m%d").to_string();
		assert_eq!(repair.repair_number, format!("REP-{}-0001", day));
		assert_eq!(repair.status, RepairStatus::Draft);
		let lines: Vec<_> = repair.items.iter().map(|i| i.line_number).collect();
		assert_eq!(lines, vec![1, 3]);
		assert_eq!(repair.unit.map(|u| u.unit_number), Some("TRK-12".to_string()));
	}

	#[tokio::test]
	async fn test_update_cannot_clear_unit() {
		let f = fixture().await;
		let repairs = f.h.engine.repairs();
		let repair = repairs.create(&f.requester, new_repair(&f.unit_id)).await.unwrap();

		let err = repairs
			.update(
				&f.requester,
				&repair.id,
				UpdateRepairRequest {
					unit_id: Some(String::new()),
					..Default::default()
				},
			)
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Unit is required");

		let other = f.h.unit("TRL-3").await;
		let updated = repairs
			.update(
				&f.requester,
				&repair.id,
				UpdateRepairRequest {
					unit_id: Some(other.id.clone()),
					notes: Some(Some("left side".into())),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(updated.unit_id, other.id);
		assert_eq!(updated.notes.as_deref(), Some("left side"));

		let err = repairs
			.update(&f.approver, &repair.id, UpdateRepairRequest::default())
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Only the creator can edit this repair");
	}

	#[tokio::test]
	async fn test_full_lifecycle_notifies_each_step() {
		let f = fixture().await;
		let repairs = f.h.engine.repairs();
		let repair = repairs.create(&f.requester, new_repair(&f.unit_id)).await.unwrap();

		let submitted = repairs.submit(&f.requester, &repair.id).await.unwrap();
		assert_eq!(submitted.message, "Repair submitted for approval");
		assert_eq!(submitted.approvers.map(|a| a.len()), Some(1));
		let sms = f.h.take_sms().await;
		assert_eq!(sms.len(), 1);
		assert_eq!(Some(sms[0].to.as_str()), f.approver.user.phone.as_deref());
		assert!(sms[0].body.starts_with(&format!(
			"New repair {} pending approval from {}.",
			repair.repair_number,
			f.requester.user.full_name()
		)));

		let approved = repairs.approve(&f.approver, &repair.id).await.unwrap();
		assert_eq!(approved.repair.status, RepairStatus::Approved);
		assert_eq!(approved.repair.approved_by_id.as_deref(), Some(f.approver.id()));
		let sms = f.h.take_sms().await;
		assert_eq!(sms.len(), 1);
		assert_eq!(Some(sms[0].to.as_str()), f.technician.user.phone.as_deref());
		assert_eq!(
			sms[0].body,
			format!(
				"Repair {} approved and ready for completion. http://fleet.test/repairs/{}",
				repair.repair_number, repair.id
			)
		);

		let err = repairs.complete(&f.approver, &repair.id).await.unwrap_err();
		assert_eq!(err.status_code(), 403);
		assert_eq!(err.to_string(), "Only technicians can mark repairs as completed");

		let done = repairs.complete(&f.technician, &repair.id).await.unwrap();
		assert_eq!(done.message, "Repair marked as completed");
		assert_eq!(done.repair.status, RepairStatus::Completed);
		assert_eq!(done.repair.completed_by_id.as_deref(), Some(f.technician.id()));
		assert!(done.repair.completed_at.is_some());
		let stored = f.h.stored_repair(&repair.id).await;
		assert_eq!(stored.status, RepairStatus::Completed);

		let sms = f.h.take_sms().await;
		assert_eq!(sms.len(), 1);
		assert_eq!(Some(sms[0].to.as_str()), f.requester.user.phone.as_deref());

		let err = repairs.complete(&f.technician, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "Only approved repairs can be marked as completed");
	}

	#[tokio::test]
	async fn test_submit_and_decision_guards() {
		let h = Harness::new().await;
		let requester = h.user("driver@example.com", None).await;
		let unit = h.unit("TRK-1").await;
		let repairs = h.engine.repairs();

		let repair = repairs.create(&requester, new_repair(&unit.id)).await.unwrap();
		let err = repairs.submit(&requester, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "No approvers configured for repairs");

		// an approver scoped to another department does not cover repairs
		let field = h.department("Field").await;
		let scoped = h.user("field-boss@example.com", None).await;
		h.make_approver(scoped.id(), &[&field.id]).await;
		let scoped = h.actor(scoped.id()).await;
		let err = repairs.submit(&requester, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "No approvers configured for repairs");

		let global = h.user("chief@example.com", None).await;
		h.make_approver(global.id(), &[]).await;
		let global = h.actor(global.id()).await;
		repairs.submit(&requester, &repair.id).await.unwrap();

		let err = repairs.approve(&requester, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "You are not an approver");
		let err = repairs.approve(&scoped, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "You cannot approve repairs");
		let err = repairs
			.reject(&scoped, &repair.id, RejectRequest::default())
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "You cannot reject repairs");

		let rejected = repairs
			.reject(
				&global,
				&repair.id,
				RejectRequest {
					comment: Some("Use the warranty shop".into()),
				},
			)
			.await
			.unwrap();
		assert_eq!(rejected.repair.status, RepairStatus::Rejected);
		assert_eq!(
			rejected.repair.rejection_comment.as_deref(),
			Some("Use the warranty shop")
		);

		let err = repairs.approve(&global, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "Only pending repairs can be approved");
	}

	#[tokio::test]
	async fn test_visibility() {
		let f = fixture().await;
		let repairs = f.h.engine.repairs();
		let outsider = f.h.user("other@example.com", None).await;

		let draft = repairs.create(&f.requester, new_repair(&f.unit_id)).await.unwrap();
		let pending = repairs.create(&f.requester, new_repair(&f.unit_id)).await.unwrap();
		repairs.submit(&f.requester, &pending.id).await.unwrap();
		let approved = repairs.create(&f.requester, new_repair(&f.unit_id)).await.unwrap();
		repairs.submit(&f.requester, &approved.id).await.unwrap();
		repairs.approve(&f.approver, &approved.id).await.unwrap();

		let ids = |views: Vec<RepairView>| views.into_iter().map(|r| r.id).collect::<Vec<_>>();
		assert_eq!(ids(repairs.list_own(&f.approver).await.unwrap()), vec![pending.id.clone()]);
		assert_eq!(ids(repairs.list_own(&f.technician).await.unwrap()), vec![approved.id.clone()]);
		assert_eq!(repairs.list_own(&f.requester).await.unwrap().len(), 3);
		assert!(repairs.list_own(&outsider).await.unwrap().is_empty());

		assert!(repairs.get(&f.technician, &draft.id).await.is_ok());
		let err = repairs.get(&outsider, &draft.id).await.unwrap_err();
		assert_eq!(err.to_string(), "Access denied");

		let all = repairs
			.list_all(&f.technician, RepairFilter::default())
			.await
			.unwrap();
		assert_eq!(all.len(), 3);
		let filtered = repairs
			.list_all(
				&f.approver,
				RepairFilter {
					status: Some("approved".into()),
					unit_id: Some(f.unit_id.clone()),
					..Default::default()
				},
			)
			.await
			.unwrap();
		assert_eq!(ids(filtered), vec![approved.id.clone()]);
		let err = repairs
			.list_all(&outsider, RepairFilter::default())
			.await
			.unwrap_err();
		assert_eq!(err.status_code(), 403);

		let approvers = repairs.approvers(&outsider, &draft.id).await.unwrap();
		assert_eq!(approvers.len(), 1);
	}

	#[tokio::test]
	async fn test_delete() {
		let f = fixture().await;
		let repairs = f.h.engine.repairs();
		let repair = repairs.create(&f.requester, new_repair(&f.unit_id)).await.unwrap();

		let err = repairs.delete(&f.technician, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "Only the creator or admin can delete this repair");

		let ok = repairs.delete(&f.requester, &repair.id).await.unwrap();
		assert_eq!(ok.message, "Repair deleted");
		let err = repairs.delete(&f.requester, &repair.id).await.unwrap_err();
		assert_eq!(err.to_string(), "Repair not found");
	}
}
