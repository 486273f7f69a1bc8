//! Type-ahead lookups and quick-create endpoints used by the order and
//! repair forms. Open to every authenticated user.

use chrono::Utc;
use std::sync::Arc;
use tracker_storage::StorageService;
use tracker_types::{
	listing::contains_ci, new_id, truncate_id, Department, LookupQuery, StorageKey, Unit,
	UnitRequest, UnitType, UnitView, Vendor, VendorRequest,
};

use super::directory::parse_unit_type;
use super::{clean_optional, WriteLock};
use crate::engine::context::{Actor, Snapshot};
use crate::{non_blank, validation, TrackerError};

/// Most rows a lookup returns.
const LOOKUP_LIMIT: usize = 50;

fn needle(query: &LookupQuery) -> Option<String> {
	non_blank(query.q.as_deref()).map(str::to_lowercase)
}

pub struct LookupHandler {
	storage: Arc<StorageService>,
	lock: WriteLock,
}

impl LookupHandler {
	pub fn new(storage: Arc<StorageService>, lock: WriteLock) -> Self {
		Self { storage, lock }
	}

	/// Active vendors whose name contains `q`, by name.
	pub async fn vendors(&self, query: &LookupQuery) -> Result<Vec<Vendor>, TrackerError> {
		let needle = needle(query);
		let mut vendors: Vec<Vendor> = self
			.storage
			.retrieve_all::<Vendor>(StorageKey::Vendors)
			.await?
			.into_iter()
			.filter(|v| v.is_active)
			.filter(|v| needle.as_deref().map_or(true, |n| contains_ci(&v.name, n)))
			.collect();
		vendors.sort_by_key(|v| v.name.to_lowercase());
		vendors.truncate(LOOKUP_LIMIT);
		Ok(vendors)
	}

	/// Active units whose number or description contains `q`, by number.
	pub async fn units(&self, query: &LookupQuery) -> Result<Vec<UnitView>, TrackerError> {
		let needle = needle(query);
		let snapshot = Snapshot::load(&self.storage).await?;
		let mut units: Vec<&Unit> = snapshot
			.units
			.values()
			.filter(|u| u.is_active)
			.filter(|u| {
				needle.as_deref().map_or(true, |n| {
					contains_ci(&u.unit_number, n)
						|| u.description.as_deref().is_some_and(|d| contains_ci(d, n))
				})
			})
			.collect();
		units.sort_by_key(|u| u.unit_number.to_lowercase());
		Ok(units
			.into_iter()
			.take(LOOKUP_LIMIT)
			.map(|u| snapshot.unit_view(u))
			.collect())
	}

	/// Active departments, by name.
	pub async fn departments(&self) -> Result<Vec<Department>, TrackerError> {
		let mut departments: Vec<Department> = self
			.storage
			.retrieve_all::<Department>(StorageKey::Departments)
			.await?
			.into_iter()
			.filter(|d| d.is_active)
			.collect();
		departments.sort_by_key(|d| d.name.to_lowercase());
		Ok(departments)
	}

	/// Creates an active vendor from the order form's combo box.
	pub async fn quick_vendor(&self, actor: &Actor, request: VendorRequest) -> Result<Vendor, TrackerError> {
		let name = non_blank(request.name.as_deref()).ok_or_else(|| validation("Name is required"))?;

		let now = Utc::now();
		let vendor = Vendor {
			id: new_id(),
			name: name.to_string(),
			contact_info: clean_optional(request.contact_info.flatten()),
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Vendors, &vendor.id, &vendor)
			.await?;
		tracing::info!(
			vendor_id = %truncate_id(&vendor.id),
			user_id = %truncate_id(actor.id()),
			"Vendor quick-created"
		);
		Ok(vendor)
	}

	/// Creates an active unit from a form's combo box. Unit numbers stay
	/// unique.
	pub async fn quick_unit(&self, actor: &Actor, request: UnitRequest) -> Result<UnitView, TrackerError> {
		let unit_number = non_blank(request.unit_number.as_deref())
			.ok_or_else(|| validation("Unit number is required"))?
			.to_string();
		let unit_type = match request.unit_type.as_deref() {
			Some(value) => parse_unit_type(value)?,
			None => UnitType::Other,
		};

		let guard = self.lock.lock().await;
		let units: Vec<Unit> = self.storage.retrieve_all(StorageKey::Units).await?;
		if units.iter().any(|u| u.unit_number == unit_number) {
			return Err(TrackerError::Conflict(
				"Unit with this number already exists".into(),
			));
		}

		let now = Utc::now();
		let unit = Unit {
			id: new_id(),
			unit_number,
			description: clean_optional(request.description.flatten()),
			unit_type,
			department_id: clean_optional(request.department_id.flatten()),
			is_active: true,
			created_by_id: Some(actor.id().to_string()),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Units, &unit.id, &unit)
			.await?;
		drop(guard);

		tracing::info!(unit_id = %truncate_id(&unit.id), "Unit quick-created");
		Ok(Snapshot::load(&self.storage).await?.unit_view(&unit))
	}
}
