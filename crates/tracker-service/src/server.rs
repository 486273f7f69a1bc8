//! HTTP server for the tracker API.
//!
//! Builds the `/api` router with CORS, request-size and tracing layers and
//! serves it until the task is dropped.

use axum::{
	extract::DefaultBodyLimit,
	http::{header, HeaderValue, Method},
	Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	trace::TraceLayer,
};
use tracker_config::ApiConfig;
use tracker_core::TrackerEngine;

use crate::apis;

/// Origins allowed when the config names none; the web client's dev server.
const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the tracker engine for processing requests.
	pub engine: Arc<TrackerEngine>,
}

/// Builds the complete router. Split from [`start_server`] so tests can
/// drive it without binding a socket.
pub fn build_router(state: AppState) -> Router {
	let api = Router::new()
		.nest("/auth", apis::auth::router())
		.nest("/admin", apis::admin::router())
		.merge(apis::order::router())
		.merge(apis::repair::router())
		.merge(apis::po_group::router())
		.nest("/lookup", apis::lookup::router());

	let max_request_size = state
		.engine
		.config()
		.api
		.as_ref()
		.map(|api| api.max_request_size)
		.unwrap_or(1024 * 1024);

	Router::new()
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(state.engine.config().api.as_ref()))
				.layer(DefaultBodyLimit::max(max_request_size)),
		)
		.with_state(state)
}

/// Credentialed CORS for the configured origins. Wildcards and origins that
/// are not valid header values are skipped with a warning.
fn cors_layer(api_config: Option<&ApiConfig>) -> CorsLayer {
	let configured: Vec<String> = api_config
		.and_then(|api| api.cors.as_ref())
		.map(|cors| cors.allowed_origins.clone())
		.unwrap_or_default();
	let origins: Vec<String> = if configured.is_empty() {
		DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
	} else {
		configured
	};

	let allowed: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(_) if origin.trim() == "*" => {
				tracing::warn!("Ignoring wildcard CORS origin");
				None
			},
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(allowed))
		.allow_credentials(true)
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
		.allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<TrackerEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = build_router(AppState { engine });

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Tracker API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
