//! Purchase-order endpoints under `/api/order`.

use axum::{
	body::Bytes,
	extract::{Path, Query, State},
	http::StatusCode,
	routing::{get, post, put},
	Json, Router,
};
use tracker_types::{
	AdminItemsRequest, ApproverView, CreateOrderRequest, MessageResponse, OrderActionResponse,
	OrderFilter, OrderView, RejectRequest, UpdateOrderRequest,
};

use super::{api_error, optional_body, ApiJson, ApiResult, Session};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/order", get(list_own).post(create))
		.route("/order/", get(list_own).post(create))
		.route("/order/all", get(list_all))
		.route("/order/{id}", get(get_one).put(update).delete(delete))
		.route("/order/{id}/submit", post(submit))
		.route("/order/{id}/approve", post(approve))
		.route("/order/{id}/reject", post(reject))
		.route("/order/{id}/approvers", get(approvers))
		.route("/order/{id}/admin-items", put(admin_items))
		.route("/order/{id}/mark-paid", post(mark_paid))
}

/// Handles GET /api/order/ requests: the caller's own orders plus those
/// waiting on their approval.
async fn list_own(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<Vec<OrderView>>> {
	let orders = state.engine.orders().list_own(&actor).await.map_err(api_error)?;
	Ok(Json(orders))
}

async fn list_all(
	State(state): State<AppState>,
	Session(actor): Session,
	Query(filter): Query<OrderFilter>,
) -> ApiResult<Json<Vec<OrderView>>> {
	let orders = state
		.engine
		.orders()
		.list_all(&actor, filter)
		.await
		.map_err(api_error)?;
	Ok(Json(orders))
}

async fn get_one(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
	let order = state.engine.orders().get(&actor, &id).await.map_err(api_error)?;
	Ok(Json(order))
}

async fn create(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderView>)> {
	let order = state
		.engine
		.orders()
		.create(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(order)))
}

async fn update(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<UpdateOrderRequest>,
) -> ApiResult<Json<OrderView>> {
	let order = state
		.engine
		.orders()
		.update(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(order))
}

async fn delete(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.orders()
		.delete(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn submit(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<OrderActionResponse>> {
	let response = state
		.engine
		.orders()
		.submit(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn approve(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<OrderActionResponse>> {
	let response = state
		.engine
		.orders()
		.approve(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

/// Handles POST /api/order/{id}/reject. The body, and its comment, are
/// optional.
async fn reject(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	body: Bytes,
) -> ApiResult<Json<OrderActionResponse>> {
	let request: RejectRequest = optional_body(&body)?;
	let response = state
		.engine
		.orders()
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
		.orders()
		.approvers(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(approvers))
}

async fn admin_items(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<AdminItemsRequest>,
) -> ApiResult<Json<OrderActionResponse>> {
	let response = state
		.engine
		.orders()
		.admin_update_items(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn mark_paid(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<OrderActionResponse>> {
	let response = state
		.engine
		.orders()
		.mark_paid(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}
