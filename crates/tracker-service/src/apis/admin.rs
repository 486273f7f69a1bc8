//! Reference-data administration under `/api/admin`.
//!
//! Every route requires an admin session; the engine enforces that, so the
//! handlers only decode requests and pick status codes.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	routing::get,
	Json, Router,
};
use std::collections::HashMap;
use tracker_types::{
	ApproverView, CreateApproverRequest, CreateTechnicianRequest, CreateUserRequest, Department,
	DepartmentRequest, ListQuery, MessageResponse, Page, TechnicianView, UnitRequest,
	UnitTypesResponse, UnitView, UpdateApproverRequest, UpdateTechnicianRequest,
	UpdateUserRequest, UserView, Vendor, VendorRequest,
};

use super::{api_error, ApiJson, ApiResult, Session};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/departments", get(list_departments).post(create_department))
		.route(
			"/departments/{id}",
			get(get_department)
				.put(update_department)
				.delete(delete_department),
		)
		.route("/users", get(list_users).post(create_user))
		.route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
		.route("/vendors", get(list_vendors).post(create_vendor))
		.route(
			"/vendors/{id}",
			get(get_vendor).put(update_vendor).delete(delete_vendor),
		)
		.route("/units", get(list_units).post(create_unit))
		.route("/units/{id}", get(get_unit).put(update_unit).delete(delete_unit))
		.route("/unit-types", get(unit_types))
		.route("/approvers", get(list_approvers).post(create_approver))
		.route(
			"/approvers/{id}",
			get(get_approver).put(update_approver).delete(delete_approver),
		)
		.route("/technicians", get(list_technicians).post(create_technician))
		.route(
			"/technicians/{id}",
			get(get_technician)
				.put(update_technician)
				.delete(delete_technician),
		)
}

// Departments

async fn list_departments(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<Vec<Department>>> {
	let departments = state
		.engine
		.directory()
		.list_departments(&actor)
		.await
		.map_err(api_error)?;
	Ok(Json(departments))
}

async fn get_department(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<Department>> {
	let department = state
		.engine
		.directory()
		.get_department(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(department))
}

async fn create_department(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<DepartmentRequest>,
) -> ApiResult<(StatusCode, Json<Department>)> {
	let department = state
		.engine
		.directory()
		.create_department(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(department)))
}

async fn update_department(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<DepartmentRequest>,
) -> ApiResult<Json<Department>> {
	let department = state
		.engine
		.directory()
		.update_department(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(department))
}

async fn delete_department(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.directory()
		.delete_department(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

// Users

async fn list_users(
	State(state): State<AppState>,
	Session(actor): Session,
	Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Page<UserView>>> {
	let page = state
		.engine
		.directory()
		.list_users(&actor, &ListQuery::from_params(params))
		.await
		.map_err(api_error)?;
	Ok(Json(page))
}

async fn get_user(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<UserView>> {
	let user = state
		.engine
		.directory()
		.get_user(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(user))
}

async fn create_user(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
	let user = state
		.engine
		.directory()
		.create_user(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<UserView>> {
	let user = state
		.engine
		.directory()
		.update_user(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(user))
}

async fn delete_user(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.directory()
		.delete_user(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

// Vendors

async fn list_vendors(
	State(state): State<AppState>,
	Session(actor): Session,
	Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Page<Vendor>>> {
	let page = state
		.engine
		.directory()
		.list_vendors(&actor, &ListQuery::from_params(params))
		.await
		.map_err(api_error)?;
	Ok(Json(page))
}

async fn get_vendor(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<Vendor>> {
	let vendor = state
		.engine
		.directory()
		.get_vendor(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(vendor))
}

async fn create_vendor(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<VendorRequest>,
) -> ApiResult<(StatusCode, Json<Vendor>)> {
	let vendor = state
		.engine
		.directory()
		.create_vendor(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(vendor)))
}

async fn update_vendor(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<VendorRequest>,
) -> ApiResult<Json<Vendor>> {
	let vendor = state
		.engine
		.directory()
		.update_vendor(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(vendor))
}

async fn delete_vendor(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.directory()
		.delete_vendor(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

// Units

async fn list_units(
	State(state): State<AppState>,
	Session(actor): Session,
	Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Page<UnitView>>> {
	let page = state
		.engine
		.directory()
		.list_units(&actor, &ListQuery::from_params(params))
		.await
		.map_err(api_error)?;
	Ok(Json(page))
}

async fn get_unit(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<UnitView>> {
	let unit = state
		.engine
		.directory()
		.get_unit(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(unit))
}

async fn unit_types(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<UnitTypesResponse>> {
	let response = state.engine.directory().unit_types(&actor).map_err(api_error)?;
	Ok(Json(response))
}

async fn create_unit(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<UnitRequest>,
) -> ApiResult<(StatusCode, Json<UnitView>)> {
	let unit = state
		.engine
		.directory()
		.create_unit(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(unit)))
}

async fn update_unit(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<UnitRequest>,
) -> ApiResult<Json<UnitView>> {
	let unit = state
		.engine
		.directory()
		.update_unit(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(unit))
}

async fn delete_unit(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.directory()
		.delete_unit(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

// Approvers

async fn list_approvers(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<Vec<ApproverView>>> {
	let approvers = state
		.engine
		.directory()
		.list_approvers(&actor)
		.await
		.map_err(api_error)?;
	Ok(Json(approvers))
}

async fn get_approver(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<ApproverView>> {
	let approver = state
		.engine
		.directory()
		.get_approver(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(approver))
}

async fn create_approver(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<CreateApproverRequest>,
) -> ApiResult<(StatusCode, Json<ApproverView>)> {
	let approver = state
		.engine
		.directory()
		.create_approver(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(approver)))
}

async fn update_approver(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<UpdateApproverRequest>,
) -> ApiResult<Json<ApproverView>> {
	let approver = state
		.engine
		.directory()
		.update_approver(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(approver))
}

async fn delete_approver(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.directory()
		.delete_approver(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

// Technicians

async fn list_technicians(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<Vec<TechnicianView>>> {
	let technicians = state
		.engine
		.directory()
		.list_technicians(&actor)
		.await
		.map_err(api_error)?;
	Ok(Json(technicians))
}

async fn get_technician(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<TechnicianView>> {
	let technician = state
		.engine
		.directory()
		.get_technician(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(technician))
}

async fn create_technician(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<CreateTechnicianRequest>,
) -> ApiResult<(StatusCode, Json<TechnicianView>)> {
	let technician = state
		.engine
		.directory()
		.create_technician(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(technician)))
}

async fn update_technician(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<UpdateTechnicianRequest>,
) -> ApiResult<Json<TechnicianView>> {
	let technician = state
		.engine
		.directory()
		.update_technician(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(technician))
}

async fn delete_technician(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.directory()
		.delete_technician(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

#[cfg(test)]
mod tests {
	use crate::apis::test_support::{admin_token, app, create_user, login, send};
	use axum::http::StatusCode;
	use serde_json::json;

	#[tokio::test]
	async fn test_non_admin_is_forbidden() {
		let app = app().await;
		let admin = admin_token(&app).await;
		create_user(&app, &admin, "driver@example.com", None).await;
		let driver = login(&app, "driver@example.com", "password-123").await;

		let (status, _, body) = send(&app, "GET", "/api/admin/departments", Some(&driver), None).await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["message"], "Admin privileges required");
	}

	#[tokio::test]
	async fn test_department_crud() {
		let app = app().await;
		let admin = admin_token(&app).await;

		let (status, _, created) = send(
			&app,
			"POST",
			"/api/admin/departments",
			Some(&admin),
			Some(json!({"name": "Shop", "description": "Main shop"})),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		let id = created["id"].as_str().unwrap().to_string();

		let (status, _, body) = send(
			&app,
			"POST",
			"/api/admin/departments",
			Some(&admin),
			Some(json!({"name": "Shop"})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

		let (status, _, updated) = send(
			&app,
			"PUT",
			&format!("/api/admin/departments/{}", id),
			Some(&admin),
			Some(json!({"description": null})),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert!(updated["description"].is_null());

		let (status, _, list) = send(&app, "GET", "/api/admin/departments", Some(&admin), None).await;
		assert_eq!(status, StatusCode::OK);
		let names: Vec<_> = list
			.as_array()
			.unwrap()
			.iter()
			.map(|d| d["name"].as_str().unwrap().to_string())
			.collect();
		assert_eq!(names, vec!["Repairs", "Shop"]);

		let (status, _, _) = send(
			&app,
			"DELETE",
			&format!("/api/admin/departments/{}", id),
			Some(&admin),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		let (status, _, _) = send(
			&app,
			"GET",
			&format!("/api/admin/departments/{}", id),
			Some(&admin),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_user_list_is_paginated() {
		let app = app().await;
		let admin = admin_token(&app).await;
		for email in ["amy@example.com", "bob@example.com", "cat@example.com"] {
			create_user(&app, &admin, email, None).await;
		}

		let (status, _, page) = send(
			&app,
			"GET",
			"/api/admin/users?per_page=2&page=2&sort_by=email&sort_dir=asc",
			Some(&admin),
			None,
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(page["total"], 4);
		assert_eq!(page["total_pages"], 2);
		assert_eq!(page["page"], 2);
		let emails: Vec<_> = page["data"]
			.as_array()
			.unwrap()
			.iter()
			.map(|u| u["email"].as_str().unwrap().to_string())
			.collect();
		assert_eq!(emails, vec!["bob@example.com", "cat@example.com"]);

		let (_, _, page) = send(
			&app,
			"GET",
			"/api/admin/users?search=BOB",
			Some(&admin),
			None,
		)
		.await;
		assert_eq!(page["total"], 1);
	}

	#[tokio::test]
	async fn test_user_create_validation() {
		let app = app().await;
		let admin = admin_token(&app).await;
		let (status, _, body) = send(
			&app,
			"POST",
			"/api/admin/users",
			Some(&admin),
			Some(json!({
				"email": "new@example.com",
				"password": "password-123",
				"first_name": "New",
				"last_name": "User",
			})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(body["message"].as_str().unwrap().contains("phone"));
	}

	#[tokio::test]
	async fn test_unit_types_and_unit_create() {
		let app = app().await;
		let admin = admin_token(&app).await;

		let (status, _, body) = send(&app, "GET", "/api/admin/unit-types", Some(&admin), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(
			body["unit_types"],
			json!(["vehicle", "trailer", "equipment", "location", "other"])
		);

		let (status, _, unit) = send(
			&app,
			"POST",
			"/api/admin/units",
			Some(&admin),
			Some(json!({"unit_number": "TRK-7", "unit_type": "vehicle"})),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(unit["unit_type"], "vehicle");

		let (status, _, _) = send(
			&app,
			"POST",
			"/api/admin/units",
			Some(&admin),
			Some(json!({"unit_number": "TRK-7"})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn test_approver_and_technician_roles() {
		let app = app().await;
		let admin = admin_token(&app).await;
		let user_id = create_user(&app, &admin, "boss@example.com", None).await;

		let (status, _, approver) = send(
			&app,
			"POST",
			"/api/admin/approvers",
			Some(&admin),
			Some(json!({"user_id": user_id, "department_ids": ["no-such-department"]})),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(approver["is_global_approver"], true);

		let (status, _, _) = send(
			&app,
			"POST",
			"/api/admin/approvers",
			Some(&admin),
			Some(json!({"user_id": user_id})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);

		let (status, _, technician) = send(
			&app,
			"POST",
			"/api/admin/technicians",
			Some(&admin),
			Some(json!({"user_id": user_id})),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(technician["user"]["is_technician"], true);

		let (_, _, user) = send(
			&app,
			"GET",
			&format!("/api/admin/users/{}", user_id),
			Some(&admin),
			None,
		)
		.await;
		assert_eq!(user["is_approver"], true);
		assert_eq!(user["is_technician"], true);
	}
}
