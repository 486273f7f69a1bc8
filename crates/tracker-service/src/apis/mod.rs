//! HTTP API for the tracker.
//!
//! One submodule per route prefix. Each exposes a `router()` that the server
//! nests under `/api`; handlers are thin translations onto the engine.

pub mod admin;
pub mod auth;
pub mod lookup;
pub mod order;
pub mod po_group;
pub mod repair;

use axum::{
	body::Bytes,
	extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
	http::{header, request::Parts, HeaderMap},
	Json,
};
use serde::de::DeserializeOwned;
use tracker_core::{Actor, TrackerError};
use tracker_types::APIError;

use crate::server::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

pub type ApiResult<T> = Result<T, APIError>;

/// Converts an engine error into the API error envelope. Server-side
/// failures are logged and replaced with a generic message.
pub fn api_error(err: TrackerError) -> APIError {
	let error_type = err.error_code().to_string();
	let message = err.to_string();
	match err.status_code() {
		400 => APIError::BadRequest {
			error_type,
			message,
			details: None,
		},
		401 => APIError::Unauthorized {
			error_type,
			message,
		},
		403 => APIError::Forbidden { message },
		404 => APIError::NotFound { message },
		_ => {
			tracing::error!(error = %err, "Request failed");
			APIError::InternalServerError {
				error_type,
				message: "Internal server error".to_string(),
			}
		},
	}
}

/// Session token from the `token` cookie, falling back to a bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
	let from_cookie = headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, _)| *name == SESSION_COOKIE)
		.map(|(_, value)| value.trim().to_string())
		.filter(|value| !value.is_empty());

	from_cookie.or_else(|| {
		headers
			.get(header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.map(|token| token.trim().to_string())
			.filter(|token| !token.is_empty())
	})
}

/// The authenticated caller of a request.
pub struct Session(pub Actor);

impl FromRequestParts<AppState> for Session {
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let token = session_token(&parts.headers);
		let actor = state
			.engine
			.auth()
			.authenticate(token.as_deref())
			.await
			.map_err(api_error)?;
		Ok(Session(actor))
	}
}

/// JSON body extractor that answers malformed input with the API error
/// envelope instead of axum's plain-text rejection.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
	Json<T>: FromRequest<S, Rejection = JsonRejection>,
	S: Send + Sync,
{
	type Rejection = APIError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		match Json::<T>::from_request(req, state).await {
			Ok(Json(value)) => Ok(ApiJson(value)),
			Err(rejection) => Err(APIError::BadRequest {
				error_type: "INVALID_BODY".to_string(),
				message: rejection.body_text(),
				details: None,
			}),
		}
	}
}

/// Parses an optional JSON body; an empty body yields the default.
pub fn optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(T::default());
	}
	serde_json::from_slice(body).map_err(|e| APIError::BadRequest {
		error_type: "INVALID_BODY".to_string(),
		message: format!("Invalid JSON body: {}", e),
		details: None,
	})
}


#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	#[test]
	fn test_session_token_prefers_cookie() {
		let mut headers = HeaderMap::new();
		headers.insert(
			header::COOKIE,
			HeaderValue::from_static("theme=dark; token=abc.def; other=1"),
		);
		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
		assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));

		headers.remove(header::COOKIE);
		assert_eq!(session_token(&headers).as_deref(), Some("xyz"));

		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
		assert_eq!(session_token(&headers), None);
	}

	#[test]
	fn test_api_error_hides_internal_messages() {
		let err = api_error(TrackerError::Internal("disk on fire".into()));
		assert_eq!(err.status_code(), 500);
		assert_eq!(err.to_error_response().message, "Internal server error");

		let err = api_error(TrackerError::Conflict("PO number already exists".into()));
		assert_eq!(err.status_code(), 400);
		let body = err.to_error_response();
		assert_eq!(body.error, "CONFLICT");
		assert_eq!(body.message, "PO number already exists");
	}

	#[test]
	fn test_optional_body() {
		let empty: tracker_types::RejectRequest = optional_body(&Bytes::new()).unwrap();
		assert!(empty.comment.is_none());
		let parsed: tracker_types::RejectRequest =
			optional_body(&Bytes::from_static(br#"{"comment": "Too expensive"}"#)).unwrap();
		assert_eq!(parsed.comment.as_deref(), Some("Too expensive"));
		let bad: ApiResult<tracker_types::RejectRequest> =
			optional_body(&Bytes::from_static(b"{nope"));
		assert_eq!(bad.err().map(|e| e.status_code()), Some(400));
	}
}
