//! Request context: who is acting and the reference data views are built
//! from.
//!
//! A [`Snapshot`] loads every reference record once per request so that
//! access checks and view assembly work off a consistent picture without
//! going back to storage for each relation.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use tracker_storage::{StorageError, StorageService};
use tracker_types::{
	Approver, ApproverView, Department, Order, OrderItemView, OrderView, PoGroup, PoGroupView,
	Repair, RepairView, StorageKey, Technician, TechnicianView, Unit, UnitView, User, UserView,
	Vendor, REPAIRS_DEPARTMENT_ID,
};

use crate::{forbidden, TrackerError};

/// The authenticated user together with their active workflow roles.
#[derive(Debug, Clone)]
pub struct Actor {
	pub user: User,
	/// Set only when the user holds an active approver record.
	pub approver: Option<Approver>,
	/// Set only when the user holds an active technician record.
	pub technician: Option<Technician>,
}

impl Actor {
	pub fn id(&self) -> &str {
		&self.user.id
	}

	pub fn is_admin(&self) -> bool {
		self.user.is_admin
	}

	pub fn is_approver(&self) -> bool {
		self.approver.is_some()
	}

	pub fn is_technician(&self) -> bool {
		self.technician.is_some()
	}

	pub fn is_global_approver(&self) -> bool {
		self.approver.as_ref().is_some_and(Approver::is_global_approver)
	}

	/// Whether the actor's approver scope includes `department_id`.
	pub fn covers_department(&self, department_id: Option<&str>) -> bool {
		self.approver
			.as_ref()
			.is_some_and(|a| a.can_approve_for_department(department_id))
	}

	pub fn covers_repairs(&self) -> bool {
		self.covers_department(Some(REPAIRS_DEPARTMENT_ID))
	}

	pub fn require_admin(&self) -> Result<(), TrackerError> {
		if self.is_admin() {
			Ok(())
		} else {
			Err(forbidden("Admin privileges required"))
		}
	}
}

/// Reference records keyed by id, loaded together.
#[derive(Debug, Default)]
pub struct Snapshot {
	pub users: HashMap<String, User>,
	pub departments: HashMap<String, Department>,
	pub vendors: HashMap<String, Vendor>,
	pub units: HashMap<String, Unit>,
	pub approvers: Vec<Approver>,
	pub technicians: Vec<Technician>,
	pub po_groups: HashMap<String, PoGroup>,
	active_approver_users: HashSet<String>,
	active_technician_users: HashSet<String>,
}

fn by_id<T>(records: Vec<T>, id: impl Fn(&T) -> &str) -> HashMap<String, T> {
	records
		.into_iter()
		.map(|r| (id(&r).to_string(), r))
		.collect()
}

impl Snapshot {
	pub async fn load(storage: &StorageService) -> Result<Self, StorageError> {
		let (users, departments, vendors, units, approvers, technicians, po_groups) = tokio::try_join!(
			storage.retrieve_all::<User>(StorageKey::Users),
			storage.retrieve_all::<Department>(StorageKey::Departments),
			storage.retrieve_all::<Vendor>(StorageKey::Vendors),
			storage.retrieve_all::<Unit>(StorageKey::Units),
			storage.retrieve_all::<Approver>(StorageKey::Approvers),
			storage.retrieve_all::<Technician>(StorageKey::Technicians),
			storage.retrieve_all::<PoGroup>(StorageKey::PoGroups),
		)?;

		Ok(Self::from_records(
			users,
			departments,
			vendors,
			units,
			approvers,
			technicians,
			po_groups,
		))
	}

	#[allow(clippy::too_many_arguments)]
	pub fn from_records(
		users: Vec<User>,
		departments: Vec<Department>,
		vendors: Vec<Vendor>,
		units: Vec<Unit>,
		approvers: Vec<Approver>,
		technicians: Vec<Technician>,
		po_groups: Vec<PoGroup>,
	) -> Self {
		let active_approver_users = approvers
			.iter()
			.filter(|a| a.is_active)
			.map(|a| a.user_id.clone())
			.collect();
		let active_technician_users = technicians
			.iter()
			.filter(|t| t.is_active)
			.map(|t| t.user_id.clone())
			.collect();

		Self {
			users: by_id(users, |u| &u.id),
			departments: by_id(departments, |d| &d.id),
			vendors: by_id(vendors, |v| &v.id),
			units: by_id(units, |u| &u.id),
			approvers,
			technicians,
			po_groups: by_id(po_groups, |g| &g.id),
			active_approver_users,
			active_technician_users,
		}
	}

	/// Resolves the roles `user` currently holds.
	pub fn actor(&self, user: User) -> Actor {
		let approver = self
			.approvers
			.iter()
			.find(|a| a.user_id == user.id && a.is_active)
			.cloned();
		let technician = self
			.technicians
			.iter()
			.find(|t| t.user_id == user.id && t.is_active)
			.cloned();
		Actor {
			user,
			approver,
			technician,
		}
	}

	pub fn approver_for_user(&self, user_id: &str) -> Option<&Approver> {
		self.approvers.iter().find(|a| a.user_id == user_id)
	}

	pub fn technician_for_user(&self, user_id: &str) -> Option<&Technician> {
		self.technicians.iter().find(|t| t.user_id == user_id)
	}

	/// Department of the user who created a record, if any.
	pub fn department_of(&self, user_id: &str) -> Option<&str> {
		self.users
			.get(user_id)
			.and_then(|u| u.department_id.as_deref())
	}

	pub fn user_view(&self, user: &User) -> UserView {
		UserView::new(
			user,
			self.active_approver_users.contains(&user.id),
			self.active_technician_users.contains(&user.id),
			None,
		)
	}

	/// Like [`user_view`](Self::user_view) with the department embedded.
	pub fn user_view_with_department(&self, user: &User) -> UserView {
		let mut view = self.user_view(user);
		view.department = user
			.department_id
			.as_ref()
			.and_then(|id| self.departments.get(id))
			.cloned();
		view
	}

	pub fn user_view_by_id(&self, user_id: Option<&str>) -> Option<UserView> {
		user_id
			.and_then(|id| self.users.get(id))
			.map(|u| self.user_view(u))
	}

	pub fn unit_view(&self, unit: &Unit) -> UnitView {
		UnitView {
			unit: unit.clone(),
			department: unit
				.department_id
				.as_ref()
				.and_then(|id| self.departments.get(id))
				.cloned(),
		}
	}

	/// `with_departments` embeds the covered departments, skipping ids that
	/// no longer resolve.
	pub fn approver_view(&self, approver: &Approver, with_departments: bool) -> ApproverView {
		let departments = with_departments.then(|| {
			approver
				.department_ids
				.iter()
				.filter_map(|id| self.departments.get(id))
				.cloned()
				.collect()
		});
		ApproverView {
			approver: approver.clone(),
			is_global_approver: approver.is_global_approver(),
			user: self.user_view_by_id(Some(&approver.user_id)),
			departments,
		}
	}

	pub fn technician_view(&self, technician: &Technician) -> TechnicianView {
		TechnicianView {
			technician: technician.clone(),
			user: self.user_view_by_id(Some(&technician.user_id)),
		}
	}

	pub fn order_view(&self, order: &Order) -> OrderView {
		let mut items = order.items.clone();
		items.sort_by_key(|i| i.line_number);

		OrderView {
			id: order.id.clone(),
			order_number: order.order_number.clone(),
			vendor_id: order.vendor_id.clone(),
			unit_id: order.unit_id.clone(),
			po_group_id: order.po_group_id.clone(),
			description: order.description.clone(),
			status: order.status,
			ordered_by_id: order.ordered_by_id.clone(),
			approved_by_id: order.approved_by_id.clone(),
			approved_at: order.approved_at,
			rejected_by_id: order.rejected_by_id.clone(),
			rejected_at: order.rejected_at,
			rejection_comment: order.rejection_comment.clone(),
			notes: order.notes.clone(),
			total: order.total(),
			created_at: order.created_at,
			updated_at: order.updated_at,
			vendor: self.vendors.get(&order.vendor_id).cloned(),
			unit: order
				.unit_id
				.as_ref()
				.and_then(|id| self.units.get(id))
				.cloned(),
			po_group: order
				.po_group_id
				.as_ref()
				.and_then(|id| self.po_groups.get(id))
				.cloned(),
			ordered_by: self.user_view_by_id(Some(&order.ordered_by_id)),
			approved_by: self.user_view_by_id(order.approved_by_id.as_deref()),
			rejected_by: self.user_view_by_id(order.rejected_by_id.as_deref()),
			items: items
				.into_iter()
				.map(|item| OrderItemView {
					total: item.total(),
					id: item.id,
					line_number: item.line_number,
					description: item.description,
					quantity: item.quantity,
					unit_cost: item.unit_cost,
				})
				.collect(),
		}
	}

	pub fn repair_view(&self, repair: &Repair) -> RepairView {
		let mut items = repair.items.clone();
		items.sort_by_key(|i| i.line_number);

		RepairView {
			id: repair.id.clone(),
			repair_number: repair.repair_number.clone(),
			unit_id: repair.unit_id.clone(),
			description: repair.description.clone(),
			status: repair.status,
			requested_by_id: repair.requested_by_id.clone(),
			approved_by_id: repair.approved_by_id.clone(),
			approved_at: repair.approved_at,
			rejected_by_id: repair.rejected_by_id.clone(),
			rejected_at: repair.rejected_at,
			rejection_comment: repair.rejection_comment.clone(),
			completed_by_id: repair.completed_by_id.clone(),
			completed_at: repair.completed_at,
			notes: repair.notes.clone(),
			created_at: repair.created_at,
			updated_at: repair.updated_at,
			unit: self.units.get(&repair.unit_id).cloned(),
			requested_by: self.user_view_by_id(Some(&repair.requested_by_id)),
			approved_by: self.user_view_by_id(repair.approved_by_id.as_deref()),
			rejected_by: self.user_view_by_id(repair.rejected_by_id.as_deref()),
			completed_by: self.user_view_by_id(repair.completed_by_id.as_deref()),
			items,
		}
	}

	/// Builds a PO group view from the orders assigned to it.
	///
	/// `orders` may contain orders of other groups; only members count.
	pub fn po_group_view(&self, group: &PoGroup, orders: &[Order], with_orders: bool) -> PoGroupView {
		let mut members: Vec<&Order> = orders
			.iter()
			.filter(|o| o.po_group_id.as_deref() == Some(group.id.as_str()))
			.collect();
		members.sort_by(|a, b| a.order_number.cmp(&b.order_number));

		PoGroupView {
			id: group.id.clone(),
			po_number: group.po_number.clone(),
			created_by_id: group.created_by_id.clone(),
			created_by: self.user_view_by_id(group.created_by_id.as_deref()),
			order_count: members.len(),
			total: members
				.iter()
				.map(|o| o.total())
				.fold(Decimal::ZERO, Decimal::saturating_add),
			created_at: group.created_at,
			updated_at: group.updated_at,
			orders: with_orders.then(|| members.iter().map(|o| self.order_view(o)).collect()),
		}
	}

	pub fn active_admins(&self) -> Vec<User> {
		self.users
			.values()
			.filter(|u| u.is_admin && u.is_active)
			.cloned()
			.collect()
	}

	/// Users behind active technician records.
	pub fn active_technician_users(&self) -> Vec<User> {
		self.technicians
			.iter()
			.filter(|t| t.is_active)
			.filter_map(|t| self.users.get(&t.user_id))
			.filter(|u| u.is_active)
			.cloned()
			.collect()
	}

	/// Users behind the given approvers.
	pub fn approver_users(&self, approvers: &[&Approver]) -> Vec<User> {
		approvers
			.iter()
			.filter_map(|a| self.users.get(&a.user_id))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;
	use rust_decimal::Decimal;
	use std::collections::BTreeSet;
	use tracker_types::{OrderItem, OrderStatus};

	fn user(id: &str, department: Option<&str>, admin: bool) -> User {
		let now = Utc::now();
		User {
			id: id.into(),
			email: format!("{}@example.com", id),
			password_hash: "hash".into(),
			first_name: id.into(),
			last_name: "Test".into(),
			phone: Some("5551234567".into()),
			department_id: department.map(String::from),
			job_title: None,
			is_admin: admin,
			is_active: true,
			created_at: now,
			updated_at: now,
		}
	}

	fn approver(user_id: &str, active: bool, departments: &[&str]) -> Approver {
		let now = Utc::now();
		Approver {
			id: format!("a-{}", user_id),
			user_id: user_id.into(),
			is_active: active,
			created_by_id: None,
			department_ids: departments.iter().map(|d| d.to_string()).collect::<BTreeSet<_>>(),
			created_at: now,
			updated_at: now,
		}
	}

	fn snapshot() -> Snapshot {
		let now = Utc::now();
		Snapshot::from_records(
			vec![
				user("alice", Some("shop"), false),
				user("bob", None, true),
				user("carol", Some("shop"), false),
			],
			vec![Department {
				id: "shop".into(),
				name: "Shop".into(),
				description: None,
				is_active: true,
				created_at: now,
				updated_at: now,
			}],
			vec![],
			vec![],
			vec![approver("carol", true, &["shop"]), approver("bob", false, &[])],
			vec![Technician {
				id: "t1".into(),
				user_id: "alice".into(),
				is_active: true,
				created_by_id: None,
				created_at: now,
				updated_at: now,
			}],
			vec![],
		)
	}

	#[test]
	fn test_actor_roles_only_count_active_records() {
		let snap = snapshot();
		let carol = snap.actor(snap.users["carol"].clone());
		assert!(carol.is_approver());
		assert!(carol.covers_department(Some("shop")));
		assert!(!carol.covers_repairs());
		assert!(carol.require_admin().is_err());

		let bob = snap.actor(snap.users["bob"].clone());
		assert!(!bob.is_approver());
		assert!(bob.require_admin().is_ok());

		let alice = snap.actor(snap.users["alice"].clone());
		assert!(alice.is_technician());
		assert!(!alice.is_approver());
	}

	#[test]
	fn test_user_view_flags_and_department() {
		let snap = snapshot();
		let view = snap.user_view_with_department(&snap.users["carol"]);
		assert!(view.is_approver);
		assert!(!view.is_technician);
		assert_eq!(view.department.map(|d| d.name), Some("Shop".to_string()));
		assert!(snap.user_view(&snap.users["alice"]).is_technician);
		assert!(!snap.user_view(&snap.users["bob"]).is_approver);
	}

	#[test]
	fn test_po_group_view_totals_members_only() {
		let snap = snapshot();
		let now = Utc::now();
		let group = PoGroup {
			id: "g1".into(),
			po_number: "PO-1".into(),
			created_by_id: Some("bob".into()),
			created_at: now,
			updated_at: now,
		};
		let order = |id: &str, group: Option<&str>, cost: i64| Order {
			id: id.into(),
			order_number: format!("ORD-{}", id),
			vendor_id: "v".into(),
			unit_id: None,
			po_group_id: group.map(String::from),
			description: "d".into(),
			status: OrderStatus::Approved,
			ordered_by_id: "alice".into(),
			approved_by_id: None,
			approved_at: None,
			rejected_by_id: None,
			rejected_at: None,
			rejection_comment: None,
			notes: None,
			items: vec![OrderItem {
				id: format!("i-{}", id),
				line_number: 1,
				description: "x".into(),
				quantity: Some(Decimal::from(2)),
				unit_cost: Some(Decimal::from(cost)),
			}],
			created_at: now,
			updated_at: now,
		};
		let orders = vec![order("b", Some("g1"), 5), order("a", Some("g1"), 10), order("c", None, 99)];

		let view = snap.po_group_view(&group, &orders, true);
		assert_eq!(view.order_count, 2);
		assert_eq!(view.total, Decimal::from(30));
		let numbers: Vec<_> = view.orders.unwrap().into_iter().map(|o| o.order_number).collect();
		assert_eq!(numbers, vec!["ORD-a", "ORD-b"]);
		assert_eq!(view.created_by.map(|u| u.id), Some("bob".to_string()));
	}
}
