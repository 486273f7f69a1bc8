//! Fixtures shared by the handler tests: an engine over in-memory storage,
//! a recording notifier, and helpers that seed reference data directly.

use chrono::Utc;
use std::sync::Arc;
use tracker_config::{builders::config::ConfigBuilder, Config};
use tracker_notify::implementations::memory::MemoryNotifier;
use tracker_notify::{NotificationService, SmsMessage};
use tracker_storage::implementations::memory::MemoryStorage;
use tracker_storage::StorageService;
use tracker_types::{
	new_id, normalize_email, Approver, Department, Order, Repair, StorageKey,
	Technician, Unit, UnitType, User, Vendor,
};

use crate::engine::context::Actor;
use crate::session::SessionSigner;
use crate::TrackerEngine;

pub(crate) struct Harness {
	pub engine: TrackerEngine,
	pub notifier: MemoryNotifier,
	pub config: Config,
}

impl Harness {
	pub const PASSWORD: &'static str = "correct-horse";

	/// Engine over empty memory storage with the Repairs department seeded.
	pub async fn new() -> Self {
		let config = ConfigBuilder::new()
			.client_url("http://fleet.test/")
			.build();
		let notifier = MemoryNotifier::new();
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let notifications = Arc::new(NotificationService::new(
			Box::new(notifier.clone()),
			config.tracker.client_url.clone(),
		));
		let engine = TrackerEngine::new(config.clone(), storage, notifications);
		engine.initialize().await.unwrap();

		Self {
			engine,
			notifier,
			config,
		}
	}

	fn storage(&self) -> &StorageService {
		self.engine.storage()
	}

	async fn insert_user(&self, email: &str, department_id: Option<&str>, is_admin: bool) -> User {
		let now = Utc::now();
		let local = email.split('@').next().unwrap_or(email).to_string();
		let user = User {
			id: new_id(),
			email: normalize_email(email),
			password_hash: bcrypt::hash(Self::PASSWORD, 4).unwrap(),
			first_name: local,
			last_name: "Tester".into(),
			phone: Some(format!("555{:07}", self.next_phone().await)),
			department_id: department_id.map(String::from),
			job_title: None,
			is_admin,
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage()
			.store(StorageKey::Users, &user.id, &user)
			.await
			.unwrap();
		user
	}

	async fn next_phone(&self) -> usize {
		let users: Vec<User> = self.storage().retrieve_all(StorageKey::Users).await.unwrap();
		users.len() + 1
	}

	pub async fn admin(&self) -> Actor {
		let user = self.insert_user("admin@example.com", None, true).await;
		self.actor(&user.id).await
	}

	pub async fn user(&self, email: &str, department_id: Option<&str>) -> Actor {
		let user = self.insert_user(email, department_id, false).await;
		self.actor(&user.id).await
	}

	/// Re-resolves roles, e.g. after granting approver rights.
	pub async fn actor(&self, user_id: &str) -> Actor {
		self.engine.auth().resolve_actor(user_id).await.unwrap()
	}

	pub async fn deactivate(&self, user_id: &str) {
		let mut user: User = self
			.storage()
			.retrieve(StorageKey::Users, user_id)
			.await
			.unwrap();
		user.is_active = false;
		self.storage()
			.update(StorageKey::Users, user_id, &user)
			.await
			.unwrap();
	}

	pub fn token_for(&self, user_id: &str) -> String {
		let signer = SessionSigner::new(
			self.config.auth.token_secret.clone(),
			chrono::Duration::days(self.config.auth.token_ttl_days as i64),
		);
		signer.issue(user_id, Utc::now()).unwrap().0
	}

	pub async fn department(&self, name: &str) -> Department {
		let now = Utc::now();
		let department = Department {
			id: new_id(),
			name: name.into(),
			description: None,
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage()
			.store(StorageKey::Departments, &department.id, &department)
			.await
			.unwrap();
		department
	}

	pub async fn vendor(&self, name: &str) -> Vendor {
		let now = Utc::now();
		let vendor = Vendor {
			id: new_id(),
			name: name.into(),
			contact_info: None,
			is_active: true,
			created_at: now,
			updated_at: now,
		};
		self.storage()
			.store(StorageKey::Vendors, &vendor.id, &vendor)
			.await
			.unwrap();
		vendor
	}

	pub async fn unit(&self, number: &str) -> Unit {
		let now = Utc::now();
		let unit = Unit {
			id: new_id(),
			unit_number: number.into(),
			description: None,
			unit_type: UnitType::Vehicle,
			department_id: None,
			is_active: true,
			created_by_id: None,
			created_at: now,
			updated_at: now,
		};
		self.storage()
			.store(StorageKey::Units, &unit.id, &unit)
			.await
			.unwrap();
		unit
	}

	pub async fn make_approver(&self, user_id: &str, departments: &[&str]) -> Approver {
		let now = Utc::now();
		let approver = Approver {
			id: new_id(),
			user_id: user_id.into(),
			is_active: true,
			created_by_id: None,
			department_ids: departments.iter().map(|d| d.to_string()).collect(),
			created_at: now,
			updated_at: now,
		};
		self.storage()
			.store(StorageKey::Approvers, &approver.id, &approver)
			.await
			.unwrap();
		approver
	}

	pub async fn make_technician(&self, user_id: &str) -> Technician {
		let now = Utc::now();
		let technician = Technician {
			id: new_id(),
			user_id: user_id.into(),
			is_active: true,
			created_by_id: None,
			created_at: now,
			updated_at: now,
		};
		self.storage()
			.store(StorageKey::Technicians, &technician.id, &technician)
			.await
			.unwrap();
		technician
	}

	pub async fn stored_order(&self, id: &str) -> Order {
		self.storage()
			.retrieve(StorageKey::Orders, id)
			.await
			.unwrap()
	}

	pub async fn stored_repair(&self, id: &str) -> Repair {
		self.storage()
			.retrieve(StorageKey::Repairs, id)
			.await
			.unwrap()
	}

	/// Messages sent since the last call.
	pub async fn take_sms(&self) -> Vec<SmsMessage> {
		let sent = self.notifier.sent().await;
		self.notifier.clear().await;
		sent
	}
}
