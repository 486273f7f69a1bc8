//! Repair request endpoints under `/api/repair`.

use axum::{
	body::Bytes,
	extract::{Path, Query, State},
	http::StatusCode,
	routing::{get, post},
	Json, Router,
};
use tracker_types::{
	ApproverView, CreateRepairRequest, MessageResponse, RejectRequest, RepairActionResponse,
	RepairFilter, RepairView, UpdateRepairRequest,
};

use super::{api_error, optional_body, ApiJson, ApiResult, Session};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/repair", get(list_own).post(create))
		.route("/repair/", get(list_own).post(create))
		.route("/repair/all", get(list_all))
		.route("/repair/{id}", get(get_one).put(update).delete(delete))
		.route("/repair/{id}/submit", post(submit))
		.route("/repair/{id}/approve", post(approve))
		.route("/repair/{id}/reject", post(reject))
		.route("/repair/{id}/approvers", get(approvers))
		.route("/repair/{id}/complete", post(complete))
}

async fn list_own(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<Vec<RepairView>>> {
	let repairs = state.engine.repairs().list_own(&actor).await.map_err(api_error)?;
	Ok(Json(repairs))
}

async fn list_all(
	State(state): State<AppState>,
	Session(actor): Session,
	Query(filter): Query<RepairFilter>,
) -> ApiResult<Json<Vec<RepairView>>> {
	let repairs = state
		.engine
		.repairs()
		.list_all(&actor, filter)
		.await
		.map_err(api_error)?;
	Ok(Json(repairs))
}

async fn get_one(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<RepairView>> {
	let repair = state.engine.repairs().get(&actor, &id).await.map_err(api_error)?;
	Ok(Json(repair))
}

async fn create(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<CreateRepairRequest>,
) -> ApiResult<(StatusCode, Json<RepairView>)> {
	let repair = state
		.engine
		.repairs()
		.create(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(repair)))
}

async fn update(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<UpdateRepairRequest>,
) -> ApiResult<Json<RepairView>> {
	let repair = state
		.engine
		.repairs()
		.update(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(repair))
}

async fn delete(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.repairs()
		.delete(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn submit(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<RepairActionResponse>> {
	let response = state
		.engine
		.repairs()
		.submit(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn approve(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<RepairActionResponse>> {
	let response = state
		.engine
		.repairs()
		.approve(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn reject(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	body: Bytes,
) -> ApiResult<Json<RepairActionResponse>> {
	let request: RejectRequest = optional_body(&body)?;
	let response = state
		.engine
		.repairs()
		.reject(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn approvers(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<Vec<ApproverView>>> {
	let approvers = state
		.engine
		.repairs()
		.approvers(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(approvers))
}

/// Handles POST /api/repair/{id}/complete. Technicians only.
async fn complete(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<RepairActionResponse>> {
	let response = state
		.engine
		.repairs()
		.complete(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}
