//! API types for the tracker HTTP API.
//!
//! This module defines the request bodies, response views and the error
//! envelope used by every `/api` endpoint. Views are flattened projections of
//! the stored records with related records embedded and secrets removed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::{
	Approver, Department, OrderStatus, PoGroup, RepairItem, RepairStatus, Technician, Unit,
	UnitType, User, Vendor,
};

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Missing, expired or invalid credentials (401)
	Unauthorized { error_type: String, message: String },
	/// Authenticated but not allowed (403)
	Forbidden { message: String },
	/// Resource does not exist (404)
	NotFound { message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Unauthorized { .. } => 401,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::Unauthorized {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
			APIError::Forbidden { message } => ErrorResponse {
				error: "FORBIDDEN".to_string(),
				message: message.clone(),
				details: None,
			},
			APIError::NotFound { message } => ErrorResponse {
				error: "NOT_FOUND".to_string(),
				message: message.clone(),
				details: None,
			},
			APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Unauthorized { message, .. } => write!(f, "Unauthorized: {}", message),
			APIError::Forbidden { message } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message } => write!(f, "Not Found: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}

/// Picks the first custom message out of derived validation errors,
/// ordered by field name so the result is stable.
pub fn validation_message(errors: &validator::ValidationErrors) -> String {
	let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
	fields.sort_by(|a, b| a.0.cmp(&b.0));
	fields
		.into_iter()
		.flat_map(|(_, errs)| errs.iter())
		.find_map(|e| e.message.as_ref().map(|m| m.to_string()))
		.unwrap_or_else(|| errors.to_string())
}

/// Deserializes a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable::deserialize")]`
/// on an `Option<Option<T>>`: absent gives `None`, `null` gives
/// `Some(None)`.
pub mod nullable {
	use serde::{Deserialize, Deserializer};

	pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
	where
		D: Deserializer<'de>,
		T: Deserialize<'de>,
	{
		Option::<T>::deserialize(deserializer).map(Some)
	}
}

/// Accepts numbers, numeric strings, empty strings and null for an optional
/// decimal. Form inputs post blank fields as `""`.
pub mod lenient_decimal {
	use rust_decimal::Decimal;
	use serde::{de::Error, Deserialize, Deserializer};
	use serde_json::Value;
	use std::str::FromStr;

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Option::<Value>::deserialize(deserializer)? {
			None | Some(Value::Null) => Ok(None),
			Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
			Some(Value::String(s)) => parse(s.trim()).map(Some).map_err(D::Error::custom),
			Some(Value::Number(n)) => parse(&n.to_string()).map(Some).map_err(D::Error::custom),
			Some(other) => Err(D::Error::custom(format!(
				"expected a number, got {}",
				other
			))),
		}
	}

	fn parse(s: &str) -> Result<Decimal, rust_decimal::Error> {
		Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s))
	}
}

// Requests

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ChangePasswordRequest {
	#[serde(default)]
	pub current_password: String,
	#[serde(default)]
	#[validate(length(min = 8, message = "New password must be at least 8 characters"))]
	pub new_password: String,
}

/// One submitted order line. Lines without a description are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineItemInput {
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default, deserialize_with = "lenient_decimal::deserialize")]
	pub quantity: Option<Decimal>,
	#[serde(default, deserialize_with = "lenient_decimal::deserialize")]
	pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairItemInput {
	#[serde(default)]
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
	pub vendor_id: Option<String>,
	pub unit_id: Option<String>,
	pub description: Option<String>,
	pub notes: Option<String>,
	#[serde(default)]
	pub items: Vec<LineItemInput>,
}

/// Partial order update. Absent fields are left untouched; `items`
/// replaces every line when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderRequest {
	pub vendor_id: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub unit_id: Option<Option<String>>,
	pub description: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub notes: Option<Option<String>>,
	pub items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminItemsRequest {
	pub items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectRequest {
	pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRepairRequest {
	pub unit_id: Option<String>,
	pub description: Option<String>,
	pub notes: Option<String>,
	#[serde(default)]
	pub items: Vec<RepairItemInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRepairRequest {
	pub unit_id: Option<String>,
	pub description: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub notes: Option<Option<String>>,
	pub items: Option<Vec<RepairItemInput>>,
}

/// Query parameters accepted by `GET /api/order/all`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
	pub status: Option<String>,
	pub owner_id: Option<String>,
	pub vendor_id: Option<String>,
}

/// Query parameters accepted by `GET /api/repair/all`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepairFilter {
	pub status: Option<String>,
	pub owner_id: Option<String>,
	pub unit_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentRequest {
	pub name: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub description: Option<Option<String>>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateUserRequest {
	#[serde(default)]
	#[validate(email(message = "Invalid email address"))]
	pub email: String,
	#[serde(default)]
	#[validate(length(min = 8, message = "Password must be at least 8 characters"))]
	pub password: String,
	#[serde(default)]
	pub first_name: String,
	#[serde(default)]
	pub last_name: String,
	#[serde(default)]
	pub phone: String,
	pub department_id: Option<String>,
	pub job_title: Option<String>,
	pub is_admin: Option<bool>,
	pub is_active: Option<bool>,
}

impl CreateUserRequest {
	/// Name of the first required field left blank, in form order.
	pub fn missing_field(&self) -> Option<&'static str> {
		[
			("email", &self.email),
			("password", &self.password),
			("first_name", &self.first_name),
			("last_name", &self.last_name),
			("phone", &self.phone),
		]
		.into_iter()
		.find(|(_, value)| value.trim().is_empty())
		.map(|(name, _)| name)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
	pub email: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub phone: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub department_id: Option<Option<String>>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub job_title: Option<Option<String>>,
	pub is_admin: Option<bool>,
	pub is_active: Option<bool>,
	/// Changed only when non-empty.
	pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorRequest {
	pub name: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub contact_info: Option<Option<String>>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitRequest {
	pub unit_number: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub description: Option<Option<String>>,
	pub unit_type: Option<String>,
	#[serde(default, deserialize_with = "nullable::deserialize")]
	pub department_id: Option<Option<String>>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApproverRequest {
	pub user_id: Option<String>,
	pub is_active: Option<bool>,
	#[serde(default)]
	pub department_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateApproverRequest {
	pub is_active: Option<bool>,
	/// Replaces every department assignment when present.
	pub department_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTechnicianRequest {
	pub user_id: Option<String>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTechnicianRequest {
	pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoGroupRequest {
	pub po_number: Option<String>,
}

/// `order_ids` may be posted as a list or as a single id.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OrderIds {
	Many(Vec<String>),
	One(String),
}

impl OrderIds {
	pub fn into_vec(self) -> Vec<String> {
		match self {
			OrderIds::Many(ids) => ids,
			OrderIds::One(id) => vec![id],
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOrdersRequest {
	pub order_ids: Option<OrderIds>,
}

/// `?q=` for the lookup endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupQuery {
	pub q: Option<String>,
}

// Views

/// A user as exposed over the API; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
	pub id: String,
	pub email: String,
	pub first_name: String,
	pub last_name: String,
	pub full_name: String,
	pub phone: Option<String>,
	pub department_id: Option<String>,
	pub job_title: Option<String>,
	pub is_admin: bool,
	pub is_approver: bool,
	pub is_technician: bool,
	pub is_active: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub department: Option<Department>,
}

impl UserView {
	pub fn new(
		user: &User,
		is_approver: bool,
		is_technician: bool,
		department: Option<Department>,
	) -> Self {
		Self {
			id: user.id.clone(),
			email: user.email.clone(),
			first_name: user.first_name.clone(),
			last_name: user.last_name.clone(),
			full_name: user.full_name(),
			phone: user.phone.clone(),
			department_id: user.department_id.clone(),
			job_title: user.job_title.clone(),
			is_admin: user.is_admin,
			is_approver,
			is_technician,
			is_active: user.is_active,
			created_at: user.created_at,
			updated_at: user.updated_at,
			department,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitView {
	#[serde(flatten)]
	pub unit: Unit,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub department: Option<Department>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemView {
	pub id: String,
	pub line_number: u32,
	pub description: String,
	#[serde(with = "rust_decimal::serde::float_option")]
	pub quantity: Option<Decimal>,
	#[serde(with = "rust_decimal::serde::float_option")]
	pub unit_cost: Option<Decimal>,
	#[serde(with = "rust_decimal::serde::float_option")]
	pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderView {
	pub id: String,
	pub order_number: String,
	pub vendor_id: String,
	pub unit_id: Option<String>,
	pub po_group_id: Option<String>,
	pub description: String,
	pub status: OrderStatus,
	pub ordered_by_id: String,
	pub approved_by_id: Option<String>,
	pub approved_at: Option<DateTime<Utc>>,
	pub rejected_by_id: Option<String>,
	pub rejected_at: Option<DateTime<Utc>>,
	pub rejection_comment: Option<String>,
	pub notes: Option<String>,
	#[serde(with = "rust_decimal::serde::float")]
	pub total: Decimal,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub vendor: Option<Vendor>,
	pub unit: Option<Unit>,
	pub po_group: Option<PoGroup>,
	pub ordered_by: Option<UserView>,
	pub approved_by: Option<UserView>,
	pub rejected_by: Option<UserView>,
	pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairView {
	pub id: String,
	pub repair_number: String,
	pub unit_id: String,
	pub description: String,
	pub status: RepairStatus,
	pub requested_by_id: String,
	pub approved_by_id: Option<String>,
	pub approved_at: Option<DateTime<Utc>>,
	pub rejected_by_id: Option<String>,
	pub rejected_at: Option<DateTime<Utc>>,
	pub rejection_comment: Option<String>,
	pub completed_by_id: Option<String>,
	pub completed_at: Option<DateTime<Utc>>,
	pub notes: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub unit: Option<Unit>,
	pub requested_by: Option<UserView>,
	pub approved_by: Option<UserView>,
	pub rejected_by: Option<UserView>,
	pub completed_by: Option<UserView>,
	pub items: Vec<RepairItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoGroupView {
	pub id: String,
	pub po_number: String,
	pub created_by_id: Option<String>,
	pub created_by: Option<UserView>,
	pub order_count: usize,
	#[serde(with = "rust_decimal::serde::float")]
	pub total: Decimal,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub orders: Option<Vec<OrderView>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApproverView {
	#[serde(flatten)]
	pub approver: Approver,
	pub is_global_approver: bool,
	pub user: Option<UserView>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub departments: Option<Vec<Department>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicianView {
	#[serde(flatten)]
	pub technician: Technician,
	pub user: Option<UserView>,
}

// Responses

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
	pub message: String,
}

impl MessageResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
	pub message: String,
	pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
	pub authenticated: bool,
	pub user: UserView,
}

/// Result of a workflow action on an order. `approvers` is only set on
/// submit and lists who was notified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderActionResponse {
	pub message: String,
	pub order: OrderView,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub approvers: Option<Vec<ApproverView>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairActionResponse {
	pub message: String,
	pub repair: RepairView,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub approvers: Option<Vec<ApproverView>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoGroupOrdersResponse {
	pub message: String,
	pub added: Vec<String>,
	pub po_group: PoGroupView,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoGroupRemoveResponse {
	pub message: String,
	pub po_group: PoGroupView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitTypesResponse {
	pub unit_types: Vec<UnitType>,
}
