//! Admin-maintained reference data: departments, users, vendors, units,
//! approvers and technicians.
//!
//! Every operation here requires an admin actor. Users, vendors and units
//! are never removed, only deactivated, because orders and repairs keep
//! pointing at them. Departments, approvers and technicians are removed
//! outright.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;
use tracker_config::BootstrapConfig;
use tracker_storage::StorageService;
use tracker_types::{
	format_us_phone, new_id, normalize_email, truncate_id, validation_message, Approver,
	ApproverView, CreateApproverRequest, CreateTechnicianRequest, CreateUserRequest, Department,
	DepartmentRequest, ListQuery, MessageResponse, Page, StorageKey, Technician, TechnicianView,
	Unit, UnitRequest, UnitType, UnitTypesResponse, UnitView, UpdateApproverRequest,
	UpdateTechnicianRequest, UpdateUserRequest, User, UserView, Vendor, VendorRequest,
	REPAIRS_DEPARTMENT_ID, REPAIRS_DEPARTMENT_NAME, UNIT_TABLE, USER_TABLE, VENDOR_TABLE,
};
use validator::{Validate, ValidateEmail};

use super::auth::hash_password;
use super::{clean_optional, WriteLock};
use crate::engine::context::{Actor, Snapshot};
use crate::{non_blank, not_found, validation, TrackerError};

const INVALID_PHONE: &str = "Invalid phone number. Must be a valid 10-digit US number";
const MIN_PASSWORD_LEN: usize = 8;

fn conflict(message: &str) -> TrackerError {
	TrackerError::Conflict(message.to_string())
}

/// Parses a unit type, listing the accepted values on failure.
pub(crate) fn parse_unit_type(value: &str) -> Result<UnitType, TrackerError> {
	value.parse().map_err(|_| {
		let allowed: Vec<&str> = UnitType::all().iter().map(UnitType::as_str).collect();
		validation(format!(
			"Invalid unit type. Must be one of: {}",
			allowed.join(", ")
		))
	})
}

pub struct DirectoryHandler {
	storage: Arc<StorageService>,
	lock: WriteLock,
	hash_cost: u32,
}

impl DirectoryHandler {
	pub fn new(storage: Arc<StorageService>, lock: WriteLock, hash_cost: u32) -> Self {
		Self {
			storage,
			lock,
			hash_cost,
		}
	}

	async fn snapshot(&self) -> Result<Snapshot, TrackerError> {
		Ok(Snapshot::load(&self.storage).await?)
	}

	// Departments

	pub async fn list_departments(&self, actor: &Actor) -> Result<Vec<Department>, TrackerError> {
		actor.require_admin()?;
		let mut departments: Vec<Department> =
			self.storage.retrieve_all(StorageKey::Departments).await?;
		departments.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(departments)
	}

	pub async fn get_department(&self, actor: &Actor, id: &str) -> Result<Department, TrackerError> {
		actor.require_admin()?;
		self.storage
			.find(StorageKey::Departments, id)
			.await?
			.ok_or_else(|| not_found("Department not found"))
	}

	#[instrument(skip_all)]
	pub async fn create_department(
		&self,
		actor: &Actor,
		request: DepartmentRequest,
	) -> Result<Department, TrackerError> {
		actor.require_admin()?;
		let name = non_blank(request.name.as_deref())
			.ok_or_else(|| validation("Name is required"))?
			.to_string();

		let _guard = self.lock.lock().await;
		let departments: Vec<Department> =
			self.storage.retrieve_all(StorageKey::Departments).await?;
		if departments.iter().any(|d| d.name == name) {
			return Err(conflict("Department with this name already exists"));
		}

		let now = Utc::now();
		let department = Department {
			id: new_id(),
			name,
			description: clean_optional(request.description.flatten()),
			is_active: request.is_active.unwrap_or(true),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Departments, &department.id, &department)
			.await?;
		tracing::info!(department_id = %truncate_id(&department.id), "Department created");
		Ok(department)
	}

	#[instrument(skip_all, fields(department_id = %truncate_id(id)))]
	pub async fn update_department(
		&self,
		actor: &Actor,
		id: &str,
		request: DepartmentRequest,
	) -> Result<Department, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		let departments: Vec<Department> =
			self.storage.retrieve_all(StorageKey::Departments).await?;
		let mut department = departments
			.iter()
			.find(|d| d.id == id)
			.cloned()
			.ok_or_else(|| not_found("Department not found"))?;

		if let Some(name) = request.name.as_deref() {
			let name = non_blank(Some(name)).ok_or_else(|| validation("Name is required"))?;
			if departments.iter().any(|d| d.name == name && d.id != id) {
				return Err(conflict("Department with this name already exists"));
			}
			department.name = name.to_string();
		}
		if let Some(description) = request.description {
			department.description = clean_optional(description);
		}
		if let Some(is_active) = request.is_active {
			department.is_active = is_active;
		}
		department.updated_at = Utc::now();

		self.storage
			.update(StorageKey::Departments, id, &department)
			.await?;
		Ok(department)
	}

	#[instrument(skip_all, fields(department_id = %truncate_id(id)))]
	pub async fn delete_department(
		&self,
		actor: &Actor,
		id: &str,
	) -> Result<MessageResponse, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		if !self.storage.exists(StorageKey::Departments, id).await? {
			return Err(not_found("Department not found"));
		}
		self.storage.remove(StorageKey::Departments, id).await?;
		tracing::info!("Department deleted");
		Ok(MessageResponse::new("Department deleted"))
	}

	// Users

	pub async fn list_users(
		&self,
		actor: &Actor,
		query: &ListQuery,
	) -> Result<Page<UserView>, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		let rows = snapshot
			.users
			.values()
			.map(|u| snapshot.user_view_with_department(u))
			.collect();
		Ok(USER_TABLE.apply(rows, query))
	}

	pub async fn get_user(&self, actor: &Actor, id: &str) -> Result<UserView, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		snapshot
			.users
			.get(id)
			.map(|u| snapshot.user_view_with_department(u))
			.ok_or_else(|| not_found("User not found"))
	}

	#[instrument(skip_all)]
	pub async fn create_user(
		&self,
		actor: &Actor,
		mut request: CreateUserRequest,
	) -> Result<UserView, TrackerError> {
		actor.require_admin()?;
		if let Some(field) = request.missing_field() {
			return Err(validation(format!("{} is required", field)));
		}
		request.email = normalize_email(&request.email);

		let _guard = self.lock.lock().await;
		let users: Vec<User> = self.storage.retrieve_all(StorageKey::Users).await?;
		if users.iter().any(|u| u.email == request.email) {
			return Err(conflict("User with this email already exists"));
		}
		request
			.validate()
			.map_err(|e| validation(validation_message(&e)))?;
		let phone = format_us_phone(&request.phone).ok_or_else(|| validation(INVALID_PHONE))?;

		let now = Utc::now();
		let user = User {
			id: new_id(),
			email: request.email,
			password_hash: hash_password(&request.password, self.hash_cost).await?,
			first_name: request.first_name.trim().to_string(),
			last_name: request.last_name.trim().to_string(),
			phone: Some(phone),
			department_id: clean_optional(request.department_id),
			job_title: clean_optional(request.job_title),
			is_admin: request.is_admin.unwrap_or(false),
			is_active: request.is_active.unwrap_or(true),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Users, &user.id, &user)
			.await?;
		tracing::info!(user_id = %truncate_id(&user.id), is_admin = user.is_admin, "User created");

		Ok(self.snapshot().await?.user_view_with_department(&user))
	}

	#[instrument(skip_all, fields(user_id = %truncate_id(id)))]
	pub async fn update_user(
		&self,
		actor: &Actor,
		id: &str,
		request: UpdateUserRequest,
	) -> Result<UserView, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		let users: Vec<User> = self.storage.retrieve_all(StorageKey::Users).await?;
		let mut user = users
			.iter()
			.find(|u| u.id == id)
			.cloned()
			.ok_or_else(|| not_found("User not found"))?;

		if let Some(email) = request.email.as_deref() {
			let email = normalize_email(email);
			if email.is_empty() {
				return Err(validation("email is required"));
			}
			if !email.validate_email() {
				return Err(validation("Invalid email address"));
			}
			if users.iter().any(|u| u.email == email && u.id != id) {
				return Err(conflict("User with this email already exists"));
			}
			user.email = email;
		}
		if let Some(first_name) = request.first_name.as_deref() {
			user.first_name = non_blank(Some(first_name))
				.ok_or_else(|| validation("first_name is required"))?
				.to_string();
		}
		if let Some(last_name) = request.last_name.as_deref() {
			user.last_name = non_blank(Some(last_name))
				.ok_or_else(|| validation("last_name is required"))?
				.to_string();
		}
		if let Some(phone) = request.phone.as_deref() {
			if phone.trim().is_empty() {
				return Err(validation("Phone number is required"));
			}
			user.phone = Some(format_us_phone(phone).ok_or_else(|| validation(INVALID_PHONE))?);
		}
		if let Some(department_id) = request.department_id {
			user.department_id = clean_optional(department_id);
		}
		if let Some(job_title) = request.job_title {
			user.job_title = clean_optional(job_title);
		}
		if let Some(is_admin) = request.is_admin {
			user.is_admin = is_admin;
		}
		if let Some(is_active) = request.is_active {
			user.is_active = is_active;
		}
		if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
			if password.chars().count() < MIN_PASSWORD_LEN {
				return Err(validation("Password must be at least 8 characters"));
			}
			user.password_hash = hash_password(password, self.hash_cost).await?;
		}
		user.updated_at = Utc::now();

		self.storage.update(StorageKey::Users, id, &user).await?;
		Ok(self.snapshot().await?.user_view_with_department(&user))
	}

	/// Deactivates a user. Admins cannot deactivate themselves this way.
	#[instrument(skip_all, fields(user_id = %truncate_id(id)))]
	pub async fn delete_user(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		let mut user: User = self
			.storage
			.find(StorageKey::Users, id)
			.await?
			.ok_or_else(|| not_found("User not found"))?;
		if user.id == actor.id() {
			return Err(validation("Cannot delete your own account"));
		}

		user.is_active = false;
		user.updated_at = Utc::now();
		self.storage.update(StorageKey::Users, id, &user).await?;
		tracing::info!("User deactivated");
		Ok(MessageResponse::new("User deactivated"))
	}

	// Vendors

	pub async fn list_vendors(
		&self,
		actor: &Actor,
		query: &ListQuery,
	) -> Result<Page<Vendor>, TrackerError> {
		actor.require_admin()?;
		let vendors: Vec<Vendor> = self.storage.retrieve_all(StorageKey::Vendors).await?;
		Ok(VENDOR_TABLE.apply(vendors, query))
	}

	pub async fn get_vendor(&self, actor: &Actor, id: &str) -> Result<Vendor, TrackerError> {
		actor.require_admin()?;
		self.storage
			.find(StorageKey::Vendors, id)
			.await?
			.ok_or_else(|| not_found("Vendor not found"))
	}

	#[instrument(skip_all)]
	pub async fn create_vendor(
		&self,
		actor: &Actor,
		request: VendorRequest,
	) -> Result<Vendor, TrackerError> {
		actor.require_admin()?;
		let name = non_blank(request.name.as_deref())
			.ok_or_else(|| validation("Name is required"))?;

		let now = Utc::now();
		let vendor = Vendor {
			id: new_id(),
			name: name.to_string(),
			contact_info: clean_optional(request.contact_info.flatten()),
			is_active: request.is_active.unwrap_or(true),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Vendors, &vendor.id, &vendor)
			.await?;
		tracing::info!(vendor_id = %truncate_id(&vendor.id), "Vendor created");
		Ok(vendor)
	}

	#[instrument(skip_all, fields(vendor_id = %truncate_id(id)))]
	pub async fn update_vendor(
		&self,
		actor: &Actor,
		id: &str,
		request: VendorRequest,
	) -> Result<Vendor, TrackerError> {
		let mut vendor = self.get_vendor(actor, id).await?;
		if let Some(name) = request.name.as_deref() {
			vendor.name = non_blank(Some(name))
				.ok_or_else(|| validation("Name is required"))?
				.to_string();
		}
		if let Some(contact_info) = request.contact_info {
			vendor.contact_info = clean_optional(contact_info);
		}
		if let Some(is_active) = request.is_active {
			vendor.is_active = is_active;
		}
		vendor.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Vendors, id, &vendor)
			.await?;
		Ok(vendor)
	}

	#[instrument(skip_all, fields(vendor_id = %truncate_id(id)))]
	pub async fn delete_vendor(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		let mut vendor = self.get_vendor(actor, id).await?;
		vendor.is_active = false;
		vendor.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Vendors, id, &vendor)
			.await?;
		Ok(MessageResponse::new("Vendor deactivated"))
	}

	// Units

	pub async fn list_units(
		&self,
		actor: &Actor,
		query: &ListQuery,
	) -> Result<Page<UnitView>, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		let rows = snapshot
			.units
			.values()
			.map(|u| snapshot.unit_view(u))
			.collect();
		Ok(UNIT_TABLE.apply(rows, query))
	}

	pub async fn get_unit(&self, actor: &Actor, id: &str) -> Result<UnitView, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		snapshot
			.units
			.get(id)
			.map(|u| snapshot.unit_view(u))
			.ok_or_else(|| not_found("Unit not found"))
	}

	pub fn unit_types(&self, actor: &Actor) -> Result<UnitTypesResponse, TrackerError> {
		actor.require_admin()?;
		Ok(UnitTypesResponse {
			unit_types: UnitType::all().to_vec(),
		})
	}

	#[instrument(skip_all)]
	pub async fn create_unit(&self, actor: &Actor, request: UnitRequest) -> Result<UnitView, TrackerError> {
		actor.require_admin()?;
		let unit_number = non_blank(request.unit_number.as_deref())
			.ok_or_else(|| validation("Unit number is required"))?
			.to_string();

		let _guard = self.lock.lock().await;
		let units: Vec<Unit> = self.storage.retrieve_all(StorageKey::Units).await?;
		if units.iter().any(|u| u.unit_number == unit_number) {
			return Err(conflict("Unit with this number already exists"));
		}
		let unit_type = match request.unit_type.as_deref() {
			Some(value) => parse_unit_type(value)?,
			None => UnitType::default(),
		};

		let now = Utc::now();
		let unit = Unit {
			id: new_id(),
			unit_number,
			description: clean_optional(request.description.flatten()),
			unit_type,
			department_id: clean_optional(request.department_id.flatten()),
			is_active: request.is_active.unwrap_or(true),
			created_by_id: Some(actor.id().to_string()),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Units, &unit.id, &unit)
			.await?;
		tracing::info!(unit_id = %truncate_id(&unit.id), "Unit created");
		Ok(self.snapshot().await?.unit_view(&unit))
	}

	#[instrument(skip_all, fields(unit_id = %truncate_id(id)))]
	pub async fn update_unit(
		&self,
		actor: &Actor,
		id: &str,
		request: UnitRequest,
	) -> Result<UnitView, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		let units: Vec<Unit> = self.storage.retrieve_all(StorageKey::Units).await?;
		let mut unit = units
			.iter()
			.find(|u| u.id == id)
			.cloned()
			.ok_or_else(|| not_found("Unit not found"))?;

		if let Some(number) = request.unit_number.as_deref() {
			let number =
				non_blank(Some(number)).ok_or_else(|| validation("Unit number is required"))?;
			if units.iter().any(|u| u.unit_number == number && u.id != id) {
				return Err(conflict("Unit with this number already exists"));
			}
			unit.unit_number = number.to_string();
		}
		if let Some(description) = request.description {
			unit.description = clean_optional(description);
		}
		if let Some(unit_type) = request.unit_type.as_deref() {
			unit.unit_type = parse_unit_type(unit_type)?;
		}
		if let Some(department_id) = request.department_id {
			unit.department_id = clean_optional(department_id);
		}
		if let Some(is_active) = request.is_active {
			unit.is_active = is_active;
		}
		unit.updated_at = Utc::now();

		self.storage.update(StorageKey::Units, id, &unit).await?;
		Ok(self.snapshot().await?.unit_view(&unit))
	}

	#[instrument(skip_all, fields(unit_id = %truncate_id(id)))]
	pub async fn delete_unit(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		actor.require_admin()?;
		let mut unit: Unit = self
			.storage
			.find(StorageKey::Units, id)
			.await?
			.ok_or_else(|| not_found("Unit not found"))?;
		unit.is_active = false;
		unit.updated_at = Utc::now();
		self.storage.update(StorageKey::Units, id, &unit).await?;
		Ok(MessageResponse::new("Unit deactivated"))
	}

	// Approvers

	/// Department ids from `requested` that resolve to a department.
	fn known_departments(snapshot: &Snapshot, requested: Vec<String>) -> BTreeSet<String> {
		requested
			.into_iter()
			.filter(|id| snapshot.departments.contains_key(id))
			.collect()
	}

	pub async fn list_approvers(&self, actor: &Actor) -> Result<Vec<ApproverView>, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		let mut views: Vec<ApproverView> = snapshot
			.approvers
			.iter()
			.map(|a| snapshot.approver_view(a, true))
			.collect();
		views.sort_by_key(|v| {
			v.user
				.as_ref()
				.map(|u| (u.last_name.to_lowercase(), u.first_name.to_lowercase()))
		});
		Ok(views)
	}

	pub async fn get_approver(&self, actor: &Actor, id: &str) -> Result<ApproverView, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		snapshot
			.approvers
			.iter()
			.find(|a| a.id == id)
			.map(|a| snapshot.approver_view(a, true))
			.ok_or_else(|| not_found("Approver not found"))
	}

	#[instrument(skip_all)]
	pub async fn create_approver(
		&self,
		actor: &Actor,
		request: CreateApproverRequest,
	) -> Result<ApproverView, TrackerError> {
		actor.require_admin()?;
		let user_id = non_blank(request.user_id.as_deref())
			.ok_or_else(|| validation("User ID is required"))?
			.to_string();

		let _guard = self.lock.lock().await;
		let snapshot = self.snapshot().await?;
		if !snapshot.users.contains_key(&user_id) {
			return Err(not_found("User not found"));
		}
		if snapshot.approver_for_user(&user_id).is_some() {
			return Err(conflict("This user is already an approver"));
		}

		let now = Utc::now();
		let approver = Approver {
			id: new_id(),
			user_id,
			is_active: request.is_active.unwrap_or(true),
			created_by_id: Some(actor.id().to_string()),
			department_ids: Self::known_departments(&snapshot, request.department_ids),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Approvers, &approver.id, &approver)
			.await?;
		tracing::info!(
			approver_id = %truncate_id(&approver.id),
			global = approver.is_global_approver(),
			"Approver created"
		);

		Ok(self.snapshot().await?.approver_view(&approver, true))
	}

	#[instrument(skip_all, fields(approver_id = %truncate_id(id)))]
	pub async fn update_approver(
		&self,
		actor: &Actor,
		id: &str,
		request: UpdateApproverRequest,
	) -> Result<ApproverView, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		let snapshot = self.snapshot().await?;
		let mut approver = snapshot
			.approvers
			.iter()
			.find(|a| a.id == id)
			.cloned()
			.ok_or_else(|| not_found("Approver not found"))?;

		if let Some(is_active) = request.is_active {
			approver.is_active = is_active;
		}
		if let Some(department_ids) = request.department_ids {
			approver.department_ids = Self::known_departments(&snapshot, department_ids);
		}
		approver.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Approvers, id, &approver)
			.await?;
		Ok(self.snapshot().await?.approver_view(&approver, true))
	}

	#[instrument(skip_all, fields(approver_id = %truncate_id(id)))]
	pub async fn delete_approver(&self, actor: &Actor, id: &str) -> Result<MessageResponse, TrackerError> {
		actor.require_admin()?;
		let _guard = self.lock.lock().await;
		if !self.storage.exists(StorageKey::Approvers, id).await? {
			return Err(not_found("Approver not found"));
		}
		self.storage.remove(StorageKey::Approvers, id).await?;
		tracing::info!("Approver removed");
		Ok(MessageResponse::new("Approver removed"))
	}

	// Technicians

	pub async fn list_technicians(&self, actor: &Actor) -> Result<Vec<TechnicianView>, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		let mut views: Vec<TechnicianView> = snapshot
			.technicians
			.iter()
			.map(|t| snapshot.technician_view(t))
			.collect();
		views.sort_by_key(|v| {
			v.user
				.as_ref()
				.map(|u| (u.last_name.to_lowercase(), u.first_name.to_lowercase()))
		});
		Ok(views)
	}

	pub async fn get_technician(&self, actor: &Actor, id: &str) -> Result<TechnicianView, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		snapshot
			.technicians
			.iter()
			.find(|t| t.id == id)
			.map(|t| snapshot.technician_view(t))
			.ok_or_else(|| not_found("Technician not found"))
	}

	#[instrument(skip_all)]
	pub async fn create_technician(
		&self,
		actor: &Actor,
		request: CreateTechnicianRequest,
	) -> Result<TechnicianView, TrackerError> {
		actor.require_admin()?;
		let user_id = non_blank(request.user_id.as_deref())
			.ok_or_else(|| validation("User ID is required"))?
			.to_string();

		let _guard = self.lock.lock().await;
		let snapshot = self.snapshot().await?;
		if !snapshot.users.contains_key(&user_id) {
			return Err(not_found("User not found"));
		}
		if snapshot.technician_for_user(&user_id).is_some() {
			return Err(conflict("This user is already a technician"));
		}

		let now = Utc::now();
		let technician = Technician {
			id: new_id(),
			user_id,
			is_active: request.is_active.unwrap_or(true),
			created_by_id: Some(actor.id().to_string()),
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Technicians, &technician.id, &technician)
			.await?;
		tracing::info!(technician_id = %truncate_id(&technician.id), "Technician created");

		Ok(self.snapshot().await?.technician_view(&technician))
	}

	#[instrument(skip_all, fields(technician_id = %truncate_id(id)))]
	pub async fn update_technician(
		&self,
		actor: &Actor,
		id: &str,
		request: UpdateTechnicianRequest,
	) -> Result<TechnicianView, TrackerError> {
		actor.require_admin()?;
		let snapshot = self.snapshot().await?;
		let mut technician = snapshot
			.technicians
			.iter()
			.find(|t| t.id == id)
			.cloned()
			.ok_or_else(|| not_found("Technician not found"))?;

		if let Some(is_active) = request.is_active {
			technician.is_active = is_active;
		}
		technician.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Technicians, id, &technician)
			.await?;
		Ok(self.snapshot().await?.technician_view(&technician))
	}

	#[instrument(skip_all, fields(technician_id = %truncate_id(id)))]
	pub async fn delete_technician(
		&self,
		actor: &Actor,
		id: &str,
	) -> Result<MessageResponse, TrackerError> {
		actor.require_admin()?;
		if !self.storage.exists(StorageKey::Technicians, id).await? {
			return Err(not_found("Technician not found"));
		}
		self.storage.remove(StorageKey::Technicians, id).await?;
		Ok(MessageResponse::new("Technician removed"))
	}

	// Seeding

	/// Creates the Repairs department when it is missing. Returns whether
	/// it was created.
	pub async fn ensure_repairs_department(&self) -> Result<bool, TrackerError> {
		let _guard = self.lock.lock().await;
		if self
			.storage
			.exists(StorageKey::Departments, REPAIRS_DEPARTMENT_ID)
			.await?
		{
			return Ok(false);
		}

		let now = Utc::now();
		let department = Department {
			id: REPAIRS_DEPARTMENT_ID.to_string(),
			name: REPAIRS_DEPARTMENT_NAME.to_string(),
			description: Some("Department for repair request approvals".to_string()),
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Departments, &department.id, &department)
			.await?;
		Ok(true)
	}

	/// Creates the configured bootstrap admin unless a user with that
	/// email already exists. Returns whether an account was created.
	pub async fn ensure_admin(&self, bootstrap: &BootstrapConfig) -> Result<bool, TrackerError> {
		let email = normalize_email(&bootstrap.admin_email);
		let _guard = self.lock.lock().await;
		let users: Vec<User> = self.storage.retrieve_all(StorageKey::Users).await?;
		if users.iter().any(|u| u.email == email) {
			return Ok(false);
		}

		let now = Utc::now();
		let user = User {
			id: new_id(),
			email,
			password_hash: hash_password(bootstrap.admin_password.expose_secret(), self.hash_cost)
				.await?,
			first_name: bootstrap.admin_first_name.clone(),
			last_name: bootstrap.admin_last_name.clone(),
			phone: None,
			department_id: None,
			job_title: None,
			is_admin: true,
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Users, &user.id, &user)
			.await?;
		Ok(true)
	}
}
