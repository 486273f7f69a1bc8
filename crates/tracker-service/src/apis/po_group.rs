//! PO group endpoints under `/api/po-group`. Admin only.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	routing::{delete, get, post},
	Json, Router,
};
use std::collections::HashMap;
use tracker_types::{
	AddOrdersRequest, ListQuery, MessageResponse, OrderView, Page, PoGroupOrdersResponse,
	PoGroupRemoveResponse, PoGroupRequest, PoGroupView,
};

use super::{api_error, ApiJson, ApiResult, Session};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/po-group", get(list).post(create))
		.route("/po-group/", get(list).post(create))
		.route("/po-group/available-orders", get(available_orders))
		.route(
			"/po-group/{id}",
			get(get_one).put(update).delete(delete_group),
		)
		.route("/po-group/{id}/orders", post(add_orders))
		.route("/po-group/{id}/orders/{order_id}", delete(remove_order))
}

async fn list(
	State(state): State<AppState>,
	Session(actor): Session,
	Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<Page<PoGroupView>>> {
	let page = state
		.engine
		.po_groups()
		.list(&actor, &ListQuery::from_params(params))
		.await
		.map_err(api_error)?;
	Ok(Json(page))
}

async fn get_one(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<PoGroupView>> {
	let group = state.engine.po_groups().get(&actor, &id).await.map_err(api_error)?;
	Ok(Json(group))
}

async fn create(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<PoGroupRequest>,
) -> ApiResult<(StatusCode, Json<PoGroupView>)> {
	let group = state
		.engine
		.po_groups()
		.create(&actor, request)
		.await
		.map_err(api_error)?;
	Ok((StatusCode::CREATED, Json(group)))
}

async fn update(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<PoGroupRequest>,
) -> ApiResult<Json<PoGroupView>> {
	let group = state
		.engine
		.po_groups()
		.update(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(group))
}

async fn delete_group(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.po_groups()
		.delete(&actor, &id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

/// Handles POST /api/po-group/{id}/orders. Per-order failures are reported
/// in the body, not as an error status.
async fn add_orders(
	State(state): State<AppState>,
	Session(actor): Session,
	Path(id): Path<String>,
	ApiJson(request): ApiJson<AddOrdersRequest>,
) -> ApiResult<Json<PoGroupOrdersResponse>> {
	let response = state
		.engine
		.po_groups()
		.add_orders(&actor, &id, request)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn remove_order(
	State(state): State<AppState>,
	Session(actor): Session,
	Path((id, order_id)): Path<(String, String)>,
) -> ApiResult<Json<PoGroupRemoveResponse>> {
	let response = state
		.engine
		.po_groups()
		.remove_order(&actor, &id, &order_id)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn available_orders(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<Vec<OrderView>>> {
	let orders = state
		.engine
		.po_groups()
		.available_orders(&actor)
		.await
		.map_err(api_error)?;
	Ok(Json(orders))
}
