//! PO group handler.
//!
//! Admins file approved or paid orders under an accounting PO number.
//! Membership lives on the order, so group views are rebuilt from the
//! current order set each time.

use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use tracker_storage::StorageService;
use tracker_types::{
	new_id, truncate_id, AddOrdersRequest, ListQuery, MessageResponse, Order, OrderView, Page,
	PoGroup, PoGroupOrdersResponse, PoGroupRemoveResponse, PoGroupRequest, PoGroupView,
	StorageKey, PO_GROUP_TABLE,
};

use super::WriteLock;
use crate::engine::context::{Actor, Snapshot};
use crate::state::OrderStateMachine;
use crate::{forbidden, non_blank, not_found, validation, TrackerError};

fn require_admin(actor: &Actor) -> Result<(), TrackerError> {
	if actor.is_admin() {
		Ok(())
	} else {
		Err(forbidden("Access denied"))
	}
}

pub struct PoGroupHandler {
	storage: Arc<StorageService>,
	orders: Arc<OrderStateMachine>,
	lock: WriteLock,
}

impl PoGroupHandler {
	pub fn new(storage: Arc<StorageService>, orders: Arc<OrderStateMachine>, lock: WriteLock) -> Self {
		Self {
			storage,
			orders,
			lock,
		}
	}

	async fn load(&self, id: &str) -> Result<PoGroup, TrackerError> {
		self.storage
			.find(StorageKey::PoGroups, id)
			.await?
			.ok_or_else(|| not_found("PO Group not found"))
	}

	async fn view(&self, group: &PoGroup, with_orders: bool) -> Result<PoGroupView, TrackerError> {
		let snapshot = Snapshot::load(&self.storage).await?;
		let orders = self.orders.all().await?;
		Ok(snapshot.po_group_view(group, &orders, with_orders))
	}

	/// Fails when another group already uses `po_number`.
	async fn ensure_unique(&self, po_number: &str, except: Option<&str>) -> Result<(), TrackerError> {
		let groups: Vec<PoGroup> = self.storage.retrieve_all(StorageKey::PoGroups).await?;
		let taken = groups
			.iter()
			.any(|g| g.po_number == po_number && Some(g.id.as_str()) != except);
		if taken {
			return Err(TrackerError::Conflict("PO number already exists".into()));
		}
		Ok(())
	}

	pub async fn list(&self, actor: &Actor, query: &ListQuery) -> Result<Page<PoGroupView>, TrackerError> {
		require_admin(actor)?;
		let snapshot = Snapshot::load(&self.storage).await?;
		let orders = self.orders.all().await?;
		let views = snapshot
			.po_groups
			.values()
			.map(|g| snapshot.po_group_view(g, &orders, false))
			.collect();
		Ok(PO_GROUP_TABLE.apply(views, query))
	}

	pub async fn get(&self, actor: &Actor, id: &str) -> Result<PoGroupView, TrackerError> {
		require_admin(actor)?;
		let group = self.load(id).await?;
		self.view(&group, true).await
	}

	#[instrument(skip_all)]
	pub async fn create(&self, actor: &Actor, request: PoGroupRequest) -> Result<PoGroupView, TrackerError> {
		require_admin(actor)?;
		let po_number = non_blank(request.po_number.as_deref())
			.ok_or_else(|| validation("PO number is required"))?
			.to_string();

		let guard = self.lock.lock().await;
		self.ensure_unique(&po_number, None).await?;
		let now = Utc::now();
		let group = PoGroup {
			id: new_id(),
			po_number,
			created_by_id: Some(actor.id().to_string()),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::PoGroups, &group.id, &group)
			.await?;
		drop(guard);

		tracing::info!(po_number = %group.po_number, "PO group created");
		self.view(&group, false).await
	}

	#[instrument(skip_all, fields(po_group_id = %truncate_id(id)))]
	pub async fn update(
		&self,
		actor: &Actor,
		id: &str,
		request: PoGroupRequest,
	) -> Result<PoGroupView, TrackerError> {
		require_admin(actor)?;
		let guard = self.lock.lock().await;
		let mut group = self.load(id).await?;

		if let Some(raw) = request.po_number.as_deref() {
			let po_number = non_blank(Some(raw)).ok_or_else(|| validation("PO number is required"))?;
			self.ensure_unique(po_number, Some(id)).await?;
			group.po_number = po_number.to_string();
			group.updated_at = Utc::now();
			self.storage
				.update(StorageKey::PoGroups, id, &group)
				.await?;
		}
		drop(guard);

		self.view(&group, false).await
	}

	#[instrument(skip_all, fields(po_group_id = %truncate_id(id)))]
	pub async fn delete(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		require_admin(actor)?;
		let _guard = self.lock.lock().await;
		let group = self.load(id).await?;

		let orders = self.orders.all().await?;
		if orders.iter().any(|o| o.po_group_id.as_deref() == Some(id)) {
			return Err(validation(
				"Cannot delete PO Group with assigned orders. Remove orders first.",
			));
		}

		self.storage.remove(StorageKey::PoGroups, id).await?;
		tracing::info!(po_number = %group.po_number, "PO group deleted");
		Ok(MessageResponse::new("PO Group deleted"))
	}

	/// Assigns each listed order to the group. Orders that cannot be added
	/// are reported in `errors` without failing the request.
	#[instrument(skip_all, fields(po_group_id = %truncate_id(id)))]
	pub async fn add_orders(
		&self,
		actor: &Actor,
		id: &str,
		request: AddOrdersRequest,
	) -> Result<PoGroupOrdersResponse, TrackerError> {
		require_admin(actor)?;
		let guard = self.lock.lock().await;
		let group = self.load(id).await?;

		let order_ids = request
			.order_ids
			.map(|ids| ids.into_vec())
			.filter(|ids| !ids.is_empty())
			.ok_or_else(|| validation("Order IDs are required"))?;

		let mut added = Vec::new();
		let mut errors = Vec::new();
		for order_id in order_ids {
			let Some(order) = self.orders.get(&order_id).await? else {
				errors.push(format!("Order {} not found", order_id));
				continue;
			};
			if !order.status.is_approved_spend() {
				errors.push(format!("Order {} is not approved or paid", order.order_number));
				continue;
			}
			match order.po_group_id.as_deref() {
				Some(current) if current == id => {
					errors.push(format!(
						"Order {} is already in this PO Group",
						order.order_number
					));
					continue;
				},
				Some(_) => {
					errors.push(format!(
						"Order {} is already in another PO Group",
						order.order_number
					));
					continue;
				},
				None => {},
			}

			let order = self
				.orders
				.update_with(order, |o| o.po_group_id = Some(id.to_string()))
				.await?;
			added.push(order.order_number);
		}
		drop(guard);

		tracing::info!(
			po_number = %group.po_number,
			added = added.len(),
			rejected = errors.len(),
			"Orders added to PO group"
		);
		Ok(PoGroupOrdersResponse {
			message: format!("Added {} order(s) to PO Group", added.len()),
			added,
			po_group: self.view(&group, false).await?,
			errors: (!errors.is_empty()).then_some(errors),
		})
	}

	#[instrument(skip_all, fields(po_group_id = %truncate_id(id)))]
	pub async fn remove_order(
		&self,
		actor: &Actor,
		id: &str,
		order_id: &str,
	) -> Result<PoGroupRemoveResponse, TrackerError> {
		require_admin(actor)?;
		let guard = self.lock.lock().await;
		let group = self.load(id).await?;
		let order = self
			.orders
			.get(order_id)
			.await?
			.ok_or_else(|| not_found("Order not found"))?;
		if order.po_group_id.as_deref() != Some(id) {
			return Err(validation("Order is not in this PO Group"));
		}

		let order = self
			.orders
			.update_with(order, |o| o.po_group_id = None)
			.await?;
		drop(guard);

		Ok(PoGroupRemoveResponse {
			message: format!("Order {} removed from PO Group", order.order_number),
			po_group: self.view(&group, false).await?,
		})
	}

	/// Approved or paid orders not yet filed under any group, most
	/// recently approved first.
	pub async fn available_orders(&self, actor: &Actor) -> Result<Vec<OrderView>, TrackerError> {
		require_admin(actor)?;
		let snapshot = Snapshot::load(&self.storage).await?;
		let mut orders: Vec<Order> = self
			.orders
			.all()
			.await?
			.into_iter()
			.filter(|o| o.status.is_approved_spend() && o.po_group_id.is_none())
			.collect();
		orders.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));
		Ok(orders.iter().map(|o| snapshot.order_view(o)).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::Harness;
	use rust_decimal::Decimal;
	use std::collections::HashMap;
	use tracker_types::{CreateOrderRequest, LineItemInput, OrderIds, OrderStatus};

	struct Fixture {
		h: Harness,
		admin: Actor,
		approved: Vec<OrderView>,
		draft: OrderView,
	}

	/// Two approved orders worth 100 and 50, plus one draft.
	async fn fixture() -> Fixture {
		let h = Harness::new().await;
		let shop = h.department("Shop").await;
		let requester = h.user("driver@example.com", Some(&shop.id)).await;
		let boss = h.user("boss@example.com", None).await;
		h.make_approver(boss.id(), &[]).await;
		let boss = h.actor(boss.id()).await;
		let admin = h.admin().await;
		let vendor = h.vendor("Parts Co").await;
		let orders = h.engine.orders();

		let mut approved = Vec::new();
		for cost in [100, 50] {
			let order = orders
				.create(
					&requester,
					CreateOrderRequest {
						vendor_id: Some(vendor.id.clone()),
						description: Some("Tires".into()),
						items: vec![LineItemInput {
							description: Some("Tire".into()),
							quantity: Some(Decimal::ONE),
							unit_cost: Some(Decimal::from(cost)),
						}],
						..Default::default()
					},
				)
				.await
				.unwrap();
			orders.submit(&requester, &order.id).await.unwrap();
			approved.push(orders.approve(&boss, &order.id).await.unwrap().order);
		}
		let draft = orders
			.create(
				&requester,
				CreateOrderRequest {
					vendor_id: Some(vendor.id.clone()),
					description: Some("Wipers".into()),
					..Default::default()
				},
			)
			.await
			.unwrap();

		Fixture {
			h,
			admin,
			approved,
			draft,
		}
	}

	fn po(number: &str) -> PoGroupRequest {
		PoGroupRequest {
			po_number: Some(number.into()),
		}
	}

	#[tokio::test]
	async fn test_admin_only() {
		let f = fixture().await;
		let user = f.h.user("clerk@example.com", None).await;
		let groups = f.h.engine.po_groups();

		let err = groups.create(&user, po("PO-1")).await.unwrap_err();
		assert_eq!(err.status_code(), 403);
		assert_eq!(err.to_string(), "Access denied");
		assert!(groups.available_orders(&user).await.is_err());
		assert!(groups.list(&user, &ListQuery::default()).await.is_err());
	}

	#[tokio::test]
	async fn test_create_and_rename_keep_numbers_unique() {
		let f = fixture().await;
		let groups = f.h.engine.po_groups();

		let err = groups.create(&f.admin, po("  ")).await.unwrap_err();
		assert_eq!(err.to_string(), "PO number is required");

		let first = groups.create(&f.admin, po("PO-1001")).await.unwrap();
		assert_eq!(first.order_count, 0);
		assert_eq!(first.created_by_id.as_deref(), Some(f.admin.id()));
		let second = groups.create(&f.admin, po("PO-1002")).await.unwrap();

		let err = groups.create(&f.admin, po("PO-1001")).await.unwrap_err();
		assert_eq!(err.status_code(), 400);
		assert_eq!(err.to_string(), "PO number already exists");

		let err = groups
			.update(&f.admin, &second.id, po("PO-1001"))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "PO number already exists");

		// renaming to its own number is fine
		let same = groups.update(&f.admin, &first.id, po("PO-1001")).await.unwrap();
		assert_eq!(same.po_number, "PO-1001");
		let renamed = groups.update(&f.admin, &second.id, po("PO-2000")).await.unwrap();
		assert_eq!(renamed.po_number, "PO-2000");

		let err = groups.get(&f.admin, "missing").await.unwrap_err();
		assert_eq!(err.to_string(), "PO Group not found");
	}

	#[tokio::test]
	async fn test_add_orders_collects_per_order_errors() {
		let f = fixture().await;
		let groups = f.h.engine.po_groups();
		let group = groups.create(&f.admin, po("PO-1")).await.unwrap();
		let other = groups.create(&f.admin, po("PO-2")).await.unwrap();

		let err = groups
			.add_orders(&f.admin, &group.id, AddOrdersRequest::default())
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Order IDs are required");

		let response = groups
			.add_orders(
				&f.admin,
				&group.id,
				AddOrdersRequest {
					order_ids: Some(OrderIds::Many(vec![
						f.approved[0].id.clone(),
						f.draft.id.clone(),
						"missing".into(),
					])),
				},
			)
			.await
			.unwrap();
		assert_eq!(response.message, "Added 1 order(s) to PO Group");
		assert_eq!(response.added, vec![f.approved[0].order_number.clone()]);
		assert_eq!(response.po_group.order_count, 1);
		assert_eq!(response.po_group.total, Decimal::from(100));
		assert_eq!(
			response.errors.unwrap(),
			vec![
				format!("Order {} is not approved or paid", f.draft.order_number),
				"Order missing not found".to_string(),
			]
		);

		let again = groups
			.add_orders(
				&f.admin,
				&group.id,
				AddOrdersRequest {
					order_ids: Some(OrderIds::One(f.approved[0].id.clone())),
				},
			)
			.await
			.unwrap();
		assert!(again.added.is_empty());
		assert_eq!(
			again.errors.unwrap(),
			vec![format!(
				"Order {} is already in this PO Group",
				f.approved[0].order_number
			)]
		);

		let elsewhere = groups
			.add_orders(
				&f.admin,
				&other.id,
				AddOrdersRequest {
					order_ids: Some(OrderIds::One(f.approved[0].id.clone())),
				},
			)
			.await
			.unwrap();
		assert_eq!(
			elsewhere.errors.unwrap(),
			vec![format!(
				"Order {} is already in another PO Group",
				f.approved[0].order_number
			)]
		);

		let stored = f.h.stored_order(&f.approved[0].id).await;
		assert_eq!(stored.po_group_id.as_deref(), Some(group.id.as_str()));
	}

	#[tokio::test]
	async fn test_group_detail_remove_and_delete() {
		let f = fixture().await;
		let groups = f.h.engine.po_groups();
		let group = groups.create(&f.admin, po("PO-1")).await.unwrap();
		let ids: Vec<String> = f.approved.iter().map(|o| o.id.clone()).collect();
		groups
			.add_orders(
				&f.admin,
				&group.id,
				AddOrdersRequest {
					order_ids: Some(OrderIds::Many(ids)),
				},
			)
			.await
			.unwrap();

		let detail = groups.get(&f.admin, &group.id).await.unwrap();
		assert_eq!(detail.order_count, 2);
		assert_eq!(detail.total, Decimal::from(150));
		let numbers: Vec<_> = detail
			.orders
			.unwrap()
			.into_iter()
			.map(|o| o.order_number)
			.collect();
		let mut sorted = numbers.clone();
		sorted.sort();
		assert_eq!(numbers, sorted);

		let err = groups.delete(&f.admin, &group.id).await.unwrap_err();
		assert_eq!(
			err.to_string(),
			"Cannot delete PO Group with assigned orders. Remove orders first."
		);

		let err = groups
			.remove_order(&f.admin, &group.id, &f.draft.id)
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Order is not in this PO Group");

		for order in &f.approved {
			let response = groups
				.remove_order(&f.admin, &group.id, &order.id)
				.await
				.unwrap();
			assert_eq!(
				response.message,
				format!("Order {} removed from PO Group", order.order_number)
			);
		}
		assert_eq!(
			groups.get(&f.admin, &group.id).await.unwrap().order_count,
			0
		);

		let deleted = groups.delete(&f.admin, &group.id).await.unwrap();
		assert_eq!(deleted.message, "PO Group deleted");
	}

	#[tokio::test]
	async fn test_available_orders_and_listing() {
		let f = fixture().await;
		let groups = f.h.engine.po_groups();

		let available = groups.available_orders(&f.admin).await.unwrap();
		assert_eq!(available.len(), 2);
		assert!(available.iter().all(|o| o.status == OrderStatus::Approved));
		// the second order was approved last
		assert_eq!(available[0].id, f.approved[1].id);

		let group = groups.create(&f.admin, po("PO-9")).await.unwrap();
		groups.create(&f.admin, po("PO-10")).await.unwrap();
		groups
			.add_orders(
				&f.admin,
				&group.id,
				AddOrdersRequest {
					order_ids: Some(OrderIds::One(f.approved[1].id.clone())),
				},
			)
			.await
			.unwrap();
		let available = groups.available_orders(&f.admin).await.unwrap();
		assert_eq!(available.len(), 1);

		let query = ListQuery::from_params(HashMap::from([
			("sort_by".to_string(), "total".to_string()),
			("sort_dir".to_string(), "desc".to_string()),
		]));
		let page = groups.list(&f.admin, &query).await.unwrap();
		assert_eq!(page.total, 2);
		assert_eq!(page.data[0].po_number, "PO-9");
		assert_eq!(page.data[0].total, Decimal::from(50));

		let query = ListQuery::from_params(HashMap::from([("search".to_string(), "po-1".to_string())]));
		let page = groups.list(&f.admin, &query).await.unwrap();
		assert_eq!(page.data.len(), 1);
		assert_eq!(page.data[0].po_number, "PO-10");
	}
}
