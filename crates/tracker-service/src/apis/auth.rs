//! Session endpoints under `/api/auth`.
//!
//! Login hands the signed session token to the browser as an HttpOnly
//! cookie; logout revokes it server-side and clears the cookie.

use axum::{
	extract::State,
	http::{header, HeaderMap, HeaderValue},
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use tracker_types::{
	APIError, ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, SessionResponse,
};

use super::{api_error, session_token, ApiJson, ApiResult, Session, SESSION_COOKIE};
use crate::server::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/login", post(login))
		.route("/logout", post(logout))
		.route("/check-login", get(check_login))
		.route("/change-password", post(change_password))
}

/// Renders the `Set-Cookie` value for the session cookie.
fn session_cookie(value: &str, max_age_seconds: i64, secure: bool) -> Result<HeaderValue, APIError> {
	let mut cookie = format!(
		"{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
		SESSION_COOKIE, value, max_age_seconds
	);
	if secure {
		cookie.push_str("; Secure");
	}
	HeaderValue::from_str(&cookie).map_err(|e| APIError::InternalServerError {
		error_type: "INTERNAL_ERROR".to_string(),
		message: format!("Invalid cookie value: {}", e),
	})
}

/// Handles POST /api/auth/login requests.
async fn login(
	State(state): State<AppState>,
	ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
	let auth = state.engine.auth();
	let outcome = auth.login(request).await.map_err(api_error)?;
	let cookie = session_cookie(
		&outcome.token,
		auth.token_ttl().num_seconds(),
		state.engine.config().auth.cookie_secure,
	)?;

	let body: Json<LoginResponse> = Json(outcome.response);
	Ok(([(header::SET_COOKIE, cookie)], body).into_response())
}

/// Handles POST /api/auth/logout requests. Succeeds without a session.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
	let token = session_token(&headers);
	let message: MessageResponse = state
		.engine
		.auth()
		.logout(token.as_deref())
		.await
		.map_err(api_error)?;
	let cookie = session_cookie("", 0, state.engine.config().auth.cookie_secure)?;
	Ok(([(header::SET_COOKIE, cookie)], Json(message)).into_response())
}

async fn check_login(
	State(state): State<AppState>,
	Session(actor): Session,
) -> ApiResult<Json<SessionResponse>> {
	let response = state
		.engine
		.auth()
		.check_login(&actor)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}

async fn change_password(
	State(state): State<AppState>,
	Session(actor): Session,
	ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
	let response = state
		.engine
		.auth()
		.change_password(&actor, request)
		.await
		.map_err(api_error)?;
	Ok(Json(response))
}
