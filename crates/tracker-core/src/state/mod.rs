//! State management for orders and repairs.
//!
//! The transition tables decide which status a workflow action leads to;
//! the [`WorkflowStateMachine`] loads, mutates and persists records while
//! keeping `updated_at` current.

pub mod transitions;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{ActorRole, Order, OrderStatus, Repair, RepairStatus, StorageKey, WorkflowAction};

pub use transitions::{TransitionError, TransitionTable, ORDER_TRANSITIONS, REPAIR_TRANSITIONS};

/// Errors that can occur during record state management.
#[derive(Debug, Error)]
pub enum StateError {
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	#[error(transparent)]
	Transition(#[from] TransitionError),
}

/// A stored record that moves through a workflow.
pub trait WorkflowRecord: Serialize + DeserializeOwned + Send + Sync {
	type Status: Copy + Eq + Hash + fmt::Display + Send + Sync + 'static;

	const NAMESPACE: StorageKey;

	fn id(&self) -> &str;
	fn status(&self) -> Self::Status;
	fn set_status(&mut self, status: Self::Status);
	fn touch(&mut self, now: DateTime<Utc>);
	fn table() -> &'static TransitionTable<Self::Status>;
}

impl WorkflowRecord for Order {
	type Status = OrderStatus;

	const NAMESPACE: StorageKey = StorageKey::Orders;

	fn id(&self) -> &str {
		&self.id
	}

	fn status(&self) -> OrderStatus {
		self.status
	}

	fn set_status(&mut self, status: OrderStatus) {
		self.status = status;
	}

	fn touch(&mut self, now: DateTime<Utc>) {
		self.updated_at = now;
	}

	fn table() -> &'static TransitionTable<OrderStatus> {
		&ORDER_TRANSITIONS
	}
}

impl WorkflowRecord for Repair {
	type Status = RepairStatus;

	const NAMESPACE: StorageKey = StorageKey::Repairs;

	fn id(&self) -> &str {
		&self.id
	}

	fn status(&self) -> RepairStatus {
		self.status
	}

	fn set_status(&mut self, status: RepairStatus) {
		self.status = status;
	}

	fn touch(&mut self, now: DateTime<Utc>) {
		self.updated_at = now;
	}

	fn table() -> &'static TransitionTable<RepairStatus> {
		&REPAIR_TRANSITIONS
	}
}

/// Manages record state transitions and persistence.
pub struct WorkflowStateMachine<R> {
	storage: Arc<StorageService>,
	_record: PhantomData<fn() -> R>,
}

pub type OrderStateMachine = WorkflowStateMachine<Order>;
pub type RepairStateMachine = WorkflowStateMachine<Repair>;

impl<R: WorkflowRecord> WorkflowStateMachine<R> {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			_record: PhantomData,
		}
	}

	/// Gets a record by id, `None` when it does not exist.
	pub async fn get(&self, id: &str) -> Result<Option<R>, StateError> {
		Ok(self.storage.find(R::NAMESPACE, id).await?)
	}

	/// Every stored record of this kind.
	pub async fn all(&self) -> Result<Vec<R>, StateError> {
		Ok(self.storage.retrieve_all(R::NAMESPACE).await?)
	}

	/// Stores a new record.
	pub async fn store(&self, record: &R) -> Result<(), StateError> {
		Ok(self.storage.store(R::NAMESPACE, record.id(), record).await?)
	}

	pub async fn remove(&self, id: &str) -> Result<(), StateError> {
		Ok(self.storage.remove(R::NAMESPACE, id).await?)
	}

	/// Applies `updater`, refreshes `updated_at` and persists the record.
	pub async fn update_with<F>(&self, mut record: R, updater: F) -> Result<R, StateError>
	where
		F: FnOnce(&mut R),
	{
		updater(&mut record);
		record.touch(Utc::now());
		self.storage
			.update(R::NAMESPACE, record.id(), &record)
			.await?;
		Ok(record)
	}

	/// Moves `record` along the transition table and persists it.
	///
	/// `stamp` runs after the status change to record who acted and when.
	pub async fn transition<F>(
		&self,
		record: R,
		action: WorkflowAction,
		role: ActorRole,
		stamp: F,
	) -> Result<R, StateError>
	where
		F: FnOnce(&mut R, DateTime<Utc>),
	{
		let next = R::table().next(record.status(), action, role)?;
		let now = Utc::now();
		self.update_with(record, |r| {
			r.set_status(next);
			stamp(r, now);
		})
		.await
	}
}
