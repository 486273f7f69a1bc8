//! Purchase order handler.
//!
//! Requesters create and edit orders while they are drafts (or after a
//! rejection), submit them to the approvers covering their department, and
//! admins correct pricing and mark approved orders as paid. Every status
//! change goes through the order transition table.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use tracker_notify::NotificationService;
use tracker_storage::StorageService;
use tracker_types::{
	new_id, truncate_id, ActorRole, AdminItemsRequest, ApproverView, CreateOrderRequest,
	LineItemInput, MessageResponse, Order, OrderActionResponse, OrderFilter, OrderItem,
	OrderStatus, OrderView, RejectRequest, StorageKey, UpdateOrderRequest, WorkflowAction,
};

use super::{clean_optional, next_number, WriteLock};
use crate::engine::context::{Actor, Snapshot};
use crate::routing::eligible_approvers;
use crate::state::{OrderStateMachine, ORDER_TRANSITIONS};
use crate::{forbidden, non_blank, not_found, validation, TrackerError};

const ORDER_PREFIX: &str = "ORD";

/// Largest quantity or unit cost accepted on a line.
const MAX_LINE_VALUE: i64 = 1_000_000_000;

fn check_line_value(value: Option<Decimal>, field: &str) -> Result<(), TrackerError> {
	match value {
		Some(v) if v.abs() > Decimal::from(MAX_LINE_VALUE) => Err(validation(format!(
			"{} must not exceed {}",
			field, MAX_LINE_VALUE
		))),
		_ => Ok(()),
	}
}

/// Builds order lines from submitted input. Lines without a description
/// are dropped; the rest keep their 1-based position in the submission.
pub(crate) fn order_items(inputs: Vec<LineItemInput>) -> Result<Vec<OrderItem>, TrackerError> {
	let mut items = Vec::with_capacity(inputs.len());
	for (idx, input) in inputs.into_iter().enumerate() {
		let Some(description) = input.description.filter(|d| !d.trim().is_empty()) else {
			continue;
		};
		check_line_value(input.quantity, "Quantity")?;
		check_line_value(input.unit_cost, "Unit cost")?;
		items.push(OrderItem {
			id: new_id(),
			line_number: idx as u32 + 1,
			description,
			quantity: input.quantity,
			unit_cost: input.unit_cost,
		});
	}
	Ok(items)
}

pub struct OrderHandler {
	storage: Arc<StorageService>,
	notifications: Arc<NotificationService>,
	state_machine: Arc<OrderStateMachine>,
	lock: WriteLock,
}

impl OrderHandler {
	pub fn new(
		storage: Arc<StorageService>,
		notifications: Arc<NotificationService>,
		state_machine: Arc<OrderStateMachine>,
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

	async fn load(&self, id: &str) -> Result<Order, TrackerError> {
		self.state_machine
			.get(id)
			.await?
			.ok_or_else(|| not_found("Order not found"))
	}

	async fn view(&self, order: &Order) -> Result<OrderView, TrackerError> {
		Ok(self.snapshot().await?.order_view(order))
	}

	fn views(snapshot: &Snapshot, mut orders: Vec<Order>) -> Vec<OrderView> {
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		orders.iter().map(|o| snapshot.order_view(o)).collect()
	}

	/// The caller's own orders plus pending orders they may approve.
	pub async fn list_own(&self, actor: &Actor) -> Result<Vec<OrderView>, TrackerError> {
		let snapshot = self.snapshot().await?;
		let orders = self
			.state_machine
			.all()
			.await?
			.into_iter()
			.filter(|o| {
				o.ordered_by_id == actor.id()
					|| (o.status == OrderStatus::Pending
						&& actor.covers_department(snapshot.department_of(&o.ordered_by_id)))
			})
			.collect();
		Ok(Self::views(&snapshot, orders))
	}

	/// Every order the caller oversees, newest first. Admins and global
	/// approvers see all orders; scoped approvers see orders from their
	/// departments.
	pub async fn list_all(
		&self,
		actor: &Actor,
		filter: OrderFilter,
	) -> Result<Vec<OrderView>, TrackerError> {
		let sees_everything = actor.is_admin() || actor.is_global_approver();
		if !sees_everything && !actor.is_approver() {
			return Err(forbidden("Access denied"));
		}

		let status = filter
			.status
			.as_deref()
			.and_then(|s| s.parse::<OrderStatus>().ok());
		let owner_id = non_blank(filter.owner_id.as_deref());
		let vendor_id = non_blank(filter.vendor_id.as_deref());

		let snapshot = self.snapshot().await?;
		let orders = self
			.state_machine
			.all()
			.await?
			.into_iter()
			.filter(|o| status.map_or(true, |s| o.status == s))
			.filter(|o| owner_id.map_or(true, |id| o.ordered_by_id == id))
			.filter(|o| vendor_id.map_or(true, |id| o.vendor_id == id))
			.filter(|o| {
				sees_everything || actor.covers_department(snapshot.department_of(&o.ordered_by_id))
			})
			.collect();
		Ok(Self::views(&snapshot, orders))
	}

	pub async fn get(&self, actor: &Actor, id: &str) -> Result<OrderView, TrackerError> {
		let order = self.load(id).await?;
		let snapshot = self.snapshot().await?;
		let allowed = order.ordered_by_id == actor.id()
			|| actor.is_admin()
			|| actor.covers_department(snapshot.department_of(&order.ordered_by_id));
		if !allowed {
			return Err(forbidden("Access denied"));
		}
		Ok(snapshot.order_view(&order))
	}

	#[instrument(skip_all, fields(user_id = %truncate_id(actor.id())))]
	pub async fn create(
		&self,
		actor: &Actor,
		request: CreateOrderRequest,
	) -> Result<OrderView, TrackerError> {
		let vendor_id = non_blank(request.vendor_id.as_deref())
			.ok_or_else(|| validation("Vendor is required"))?
			.to_string();
		let description = non_blank(request.description.as_deref())
			.ok_or_else(|| validation("Description is required"))?
			.to_string();

		let items = order_items(request.items)?;

		let guard = self.lock.lock().await;
		if !self.storage.exists(StorageKey::Vendors, &vendor_id).await? {
			return Err(not_found("Vendor not found"));
		}
		let unit_id = clean_optional(request.unit_id);
		if let Some(unit_id) = &unit_id {
			if !self.storage.exists(StorageKey::Units, unit_id).await? {
				return Err(not_found("Unit not found"));
			}
		}

		let now = Utc::now();
		let existing = self.state_machine.all().await?;
		let order = Order {
			id: new_id(),
			order_number: next_number(
				ORDER_PREFIX,
				existing.iter().map(|o| o.order_number.as_str()),
				now,
			),
			vendor_id,
			unit_id,
			po_group_id: None,
			description,
			status: OrderStatus::Draft,
			ordered_by_id: actor.id().to_string(),
			approved_by_id: None,
			approved_at: None,
			rejected_by_id: None,
			rejected_at: None,
			rejection_comment: None,
			notes: clean_optional(request.notes),
			items,
			created_at: now,
			updated_at: now,
		};
		self.state_machine.store(&order).await?;
		drop(guard);

		tracing::info!(
			order_id = %truncate_id(&order.id),
			order_number = %order.order_number,
			items = order.items.len(),
			"Order created"
		);
		self.view(&order).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn update(
		&self,
		actor: &Actor,
		id: &str,
		request: UpdateOrderRequest,
	) -> Result<OrderView, TrackerError> {
		let guard = self.lock.lock().await;
		let order = self.load(id).await?;
		if order.ordered_by_id != actor.id() {
			return Err(forbidden("Only the creator can edit this order"));
		}
		if !order.status.is_editable() {
			return Err(validation("Only draft or rejected orders can be edited"));
		}

		if let Some(vendor_id) = request.vendor_id.as_deref() {
			if !self.storage.exists(StorageKey::Vendors, vendor_id).await? {
				return Err(not_found("Vendor not found"));
			}
		}
		let unit_id = request.unit_id.map(clean_optional);
		if let Some(Some(unit_id)) = &unit_id {
			if !self.storage.exists(StorageKey::Units, unit_id).await? {
				return Err(not_found("Unit not found"));
			}
		}
		let description = match request.description.as_deref() {
			Some(d) => Some(
				non_blank(Some(d))
					.ok_or_else(|| validation("Description is required"))?
					.to_string(),
			),
			None => None,
		};
		let items = request.items.map(order_items).transpose()?;

		let order = self
			.state_machine
			.update_with(order, |o| {
				if let Some(vendor_id) = request.vendor_id {
					o.vendor_id = vendor_id;
				}
				if let Some(unit_id) = unit_id {
					o.unit_id = unit_id;
				}
				if let Some(description) = description {
					o.description = description;
				}
				if let Some(notes) = request.notes {
					o.notes = clean_optional(notes);
				}
				if let Some(items) = items {
					o.items = items;
				}
			})
			.await?;
		drop(guard);

		self.view(&order).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn delete(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		let _guard = self.lock.lock().await;
		let order = self.load(id).await?;
		if order.ordered_by_id != actor.id() && !actor.is_admin() {
			return Err(forbidden("Only the creator or admin can delete this order"));
		}
		if order.status != OrderStatus::Draft {
			return Err(validation("Only draft orders can be deleted"));
		}

		self.state_machine.remove(id).await?;
		tracing::info!(order_number = %order.order_number, "Order deleted");
		Ok(MessageResponse::new("Order deleted"))
	}

	/// Sends a draft or rejected order to the approvers covering the
	/// requester's department.
	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn submit(&self, actor: &Actor, id: &str) -> Result<OrderActionResponse, TrackerError> {
		let guard = self.lock.lock().await;
		let order = self.load(id).await?;
		if order.ordered_by_id != actor.id() {
			return Err(forbidden("Only the creator can submit this order"));
		}
		if !ORDER_TRANSITIONS.permits(order.status, WorkflowAction::Submit) {
			return Err(validation("Only draft or rejected orders can be submitted"));
		}
		if order.items.is_empty() {
			return Err(validation("Order must have at least one item"));
		}

		let snapshot = self.snapshot().await?;
		let approvers = eligible_approvers(
			&snapshot.approvers,
			snapshot.department_of(&order.ordered_by_id),
		);
		if approvers.is_empty() {
			return Err(validation("No approvers configured for your department"));
		}

		let order = self
			.state_machine
			.transition(order, WorkflowAction::Submit, ActorRole::Requester, |_, _| {})
			.await?;
		drop(guard);
		tracing::info!(
			order_number = %order.order_number,
			approvers = approvers.len(),
			"Order submitted for approval"
		);

		self.notifications
			.order_pending(
				&order,
				&snapshot.approver_users(&approvers),
				&actor.user.full_name(),
			)
			.await;

		Ok(OrderActionResponse {
			message: "Order submitted for approval".to_string(),
			order: snapshot.order_view(&order),
			approvers: Some(
				approvers
					.iter()
					.map(|a| snapshot.approver_view(a, false))
					.collect(),
			),
		})
	}

	/// Checks that the actor may decide on a pending order.
	fn check_decision(
		actor: &Actor,
		snapshot: &Snapshot,
		order: &Order,
		action: WorkflowAction,
	) -> Result<(), TrackerError> {
		let verb = match action {
			WorkflowAction::Reject => "rejected",
			_ => "approved",
		};
		if order.status != OrderStatus::Pending {
			return Err(validation(format!("Only pending orders can be {}", verb)));
		}
		if !actor.is_approver() {
			return Err(forbidden("You are not an approver"));
		}
		if !actor.covers_department(snapshot.department_of(&order.ordered_by_id)) {
			let verb = match action {
				WorkflowAction::Reject => "reject",
				_ => "approve",
			};
			return Err(forbidden(format!(
				"You cannot {} orders from this department",
				verb
			)));
		}
		Ok(())
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn approve(&self, actor: &Actor, id: &str) -> Result<OrderActionResponse, TrackerError> {
		let guard = self.lock.lock().await;
		let order = self.load(id).await?;
		let snapshot = self.snapshot().await?;
		Self::check_decision(actor, &snapshot, &order, WorkflowAction::Approve)?;

		let approver_id = actor.id().to_string();
		let order = self
			.state_machine
			.transition(order, WorkflowAction::Approve, ActorRole::Approver, |o, now| {
				o.approved_by_id = Some(approver_id);
				o.approved_at = Some(now);
			})
			.await?;
		drop(guard);
		tracing::info!(order_number = %order.order_number, "Order approved");

		self.notifications
			.order_approved(&order, &snapshot.active_admins())
			.await;

		Ok(OrderActionResponse {
			message: "Order approved".to_string(),
			order: snapshot.order_view(&order),
			approvers: None,
		})
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn reject(
		&self,
		actor: &Actor,
		id: &str,
		request: RejectRequest,
	) -> Result<OrderActionResponse, TrackerError> {
		let guard = self.lock.lock().await;
		let order = self.load(id).await?;
		let snapshot = self.snapshot().await?;
		Self::check_decision(actor, &snapshot, &order, WorkflowAction::Reject)?;

		let approver_id = actor.id().to_string();
		let comment = request.comment.unwrap_or_default();
		let order = self
			.state_machine
			.transition(order, WorkflowAction::Reject, ActorRole::Approver, |o, now| {
				o.rejected_by_id = Some(approver_id);
				o.rejected_at = Some(now);
				o.rejection_comment = Some(comment);
			})
			.await?;
		drop(guard);
		tracing::info!(order_number = %order.order_number, "Order rejected");

		Ok(OrderActionResponse {
			message: "Order rejected".to_string(),
			order: snapshot.order_view(&order),
			approvers: None,
		})
	}

	/// Approvers who would be asked to decide on this order.
	pub async fn approvers(&self, _actor: &Actor, id: &str) -> Result<Vec<ApproverView>, TrackerError> {
		let order = self.load(id).await?;
		let snapshot = self.snapshot().await?;
		Ok(eligible_approvers(
			&snapshot.approvers,
			snapshot.department_of(&order.ordered_by_id),
		)
		.into_iter()
		.map(|a| snapshot.approver_view(a, false))
		.collect())
	}

	/// Replaces the lines of an approved or paid order, e.g. once the
	/// vendor's invoice shows the real prices.
	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn admin_update_items(
		&self,
		actor: &Actor,
		id: &str,
		request: AdminItemsRequest,
	) -> Result<OrderActionResponse, TrackerError> {
		if !actor.is_admin() {
			return Err(forbidden("Only admins can update approved order items"));
		}

		let guard = self.lock.lock().await;
		let order = self.load(id).await?;
		if !order.status.is_approved_spend() {
			return Err(validation(
				"Only approved or paid orders can have items updated by admin",
			));
		}
		let items = request
			.items
			.ok_or_else(|| validation("Items data is required"))
			.and_then(order_items)?;

		let order = self
			.state_machine
			.update_with(order, |o| o.items = items)
			.await?;
		drop(guard);
		tracing::info!(order_number = %order.order_number, total = %order.total(), "Order items updated");

		Ok(OrderActionResponse {
			message: "Order items updated".to_string(),
			order: self.view(&order).await?,
			approvers: None,
		})
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(id)))]
	pub async fn mark_paid(&self, actor: &Actor, id: &str) -> Result<OrderActionResponse, TrackerError> {
		if !actor.is_admin() {
			return Err(forbidden("Only admins can mark orders as paid"));
		}

		let guard = self.lock.lock().await;
		let order = self.load(id).await?;
		if order.status != OrderStatus::Approved {
			return Err(validation("Only approved orders can be marked as paid"));
		}

		let order = self
			.state_machine
			.transition(order, WorkflowAction::MarkPaid, ActorRole::Admin, |_, _| {})
			.await?;
		drop(guard);
		tracing::info!(order_number = %order.order_number, "Order marked as paid");

		let snapshot = self.snapshot().await?;
		if let Some(requester) = snapshot.users.get(&order.ordered_by_id) {
			let vendor_name = snapshot.vendors.get(&order.vendor_id).map(|v| v.name.as_str());
			let po_number = order
				.po_group_id
				.as_ref()
				.and_then(|id| snapshot.po_groups.get(id))
				.map(|g| g.po_number.as_str());
			self.notifications
				.order_paid(&order, requester, vendor_name, po_number)
				.await;
		}

		Ok(OrderActionResponse {
			message: "Order marked as paid".to_string(),
			order: snapshot.order_view(&order),
			approvers: None,
		})
	}
}
