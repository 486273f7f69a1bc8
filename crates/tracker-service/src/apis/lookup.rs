//! Type-ahead lookups and quick-create under `/api/lookup`.

use axum::{
	extract::{Query, State},
	http::StatusCode,
	routing::{get, post},
	Json, Router,
};
use tracker_types::{Department, LookupQuery, UnitRequest, UnitView, Vendor, VendorRequest};

use super::{api_error, ApiJson, ApiResult, Session};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/vendors/search", get(search_vendors))
		.route("/vendors", post(quick_vendor))
		.route("/units/search", get(search_units))
		.route("/units", post(quick_unit))
		.route("/departments", get(departments))
}

async fn search_vendors(
	State(state): State<AppState>,
	Session(_actor): Session,
	Query(query): Query<LookupQuery>,
) -> ApiResult<Json<Vec<Vendor>>> {
	let vendors = state.engine.lookups().vendors(&query).await.map_err(api_error)?;
	Ok(Json(vendors))
}

async fn search_units(
	State(state): State<AppState>,
	Session(_actor): Session,
	Query(query): Query<LookupQuery>,
) -> ApiResult<Json<Vec<UnitView>>> {
	let units = state.engine.lookups().units(&query).await.map_err(api_error)?;
	Ok(Json(units))
}

async fn departments(
	State(state): State<AppState>,
	Session(_actor): Session,
) -> ApiResult<Json<Vec<Department>>> {
	let departments = state.engine.lookups().departments().await.map_err(api_error)?;
	Ok(Json(departments))
}

async fn quick_vendor(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<VendorRequest>,
) -> ApiResult<(StatusCode, Json<Vendor>)> {
	let vendor = state
		.engine
		.lookups()
		.quick_vendor(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(vendor)))
}

async fn quick_unit(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<UnitRequest>,
) -> ApiResult<(StatusCode, Json<UnitView>)> {
	let unit = state
		.engine
		.lookups()
		.quick_unit(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(unit)))
}

#[cfg(test)]
mod tests {
	use crate::apis::test_support::{admin_token, app, create_user, login, send};
	use axum::http::StatusCode;
	use serde_json::json;

	#[tokio::test]
	async fn test_quick_create_and_search() {
		let app = app().await;
		let admin = admin_token(&app).await;
		create_user(&app, &admin, "driver@example.com", None).await;
		let driver = login(&app, "driver@example.com", "password-123").await;

		for name in ["Napa Auto", "Acme Parts"] {
			let (status, _, vendor) = send(
				&app,
				"POST",
				"/api/lookup/vendors",
				Some(&driver),
				Some(json!({"name": name})),
			)
			.await;
			assert_eq!(status, StatusCode::CREATED);
			assert_eq!(vendor["is_active"], true);
		}

		let (status, _, vendors) =
			send(&app, "GET", "/api/lookup/vendors/search", Some(&driver), None).await;
		assert_eq!(status, StatusCode::OK);
		let names: Vec<&str> = vendors
			.as_array()
			.unwrap()
			.iter()
			.map(|v| v["name"].as_str().unwrap())
			.collect();
		assert_eq!(names, vec!["Acme Parts", "Napa Auto"]);

		let (_, _, vendors) =
			send(&app, "GET", "/api/lookup/vendors/search?q=NAPA", Some(&driver), None).await;
		assert_eq!(vendors.as_array().unwrap().len(), 1);

		let (status, _, body) = send(
			&app,
			"POST",
			"/api/lookup/vendors",
			Some(&driver),
			Some(json!({"name": "  "})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["message"], "Name is required");
	}

	#[tokio::test]
	async fn test_quick_unit() {
		let app = app().await;
		let admin = admin_token(&app).await;

		let (status, _, unit) = send(
			&app,
			"POST",
			"/api/lookup/units",
			Some(&admin),
			Some(json!({"unit_number": "T-9", "description": "Flatbed"})),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(unit["unit_type"], "other");

		let (status, _, body) = send(
			&app,
			"POST",
			"/api/lookup/units",
			Some(&admin),
			Some(json!({"unit_number": "T-9"})),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["message"], "Unit with this number already exists");

		let (_, _, units) =
			send(&app, "GET", "/api/lookup/units/search?q=flat", Some(&admin), None).await;
		assert_eq!(units.as_array().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_departments_lists_seeded_repairs() {
		let app = app().await;
		let admin = admin_token(&app).await;
		let (status, _, departments) =
			send(&app, "GET", "/api/lookup/departments", Some(&admin), None).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(departments[0]["name"], tracker_types::REPAIRS_DEPARTMENT_NAME);
	}
}
