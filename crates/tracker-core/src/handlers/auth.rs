//! Login, logout and session verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use tracker_storage::StorageService;
use tracker_types::{
	normalize_email, truncate_id, validation_message, Approver, ChangePasswordRequest,
	LoginRequest, LoginResponse, MessageResponse, SessionResponse, StorageKey, Technician, User,
};
use validator::Validate;

use crate::engine::context::{Actor, Snapshot};
use crate::session::{SessionClaims, SessionSigner, TokenError};
use crate::{validation, TrackerError};

/// Marker stored under a logged-out session's nonce until the token would
/// have expired anyway.
#[derive(Debug, Serialize, Deserialize)]
struct RevokedSession {
	user_id: String,
	revoked_at: DateTime<Utc>,
}

/// A successful login: the token to hand to the client and the response body.
#[derive(Debug)]
pub struct LoginOutcome {
	pub token: String,
	pub claims: SessionClaims,
	pub response: LoginResponse,
}

fn unauthorized(message: impl Into<String>) -> TrackerError {
	TrackerError::Unauthorized(message.into())
}

/// Hashes `password` with bcrypt off the async runtime.
pub(crate) async fn hash_password(password: &str, cost: u32) -> Result<String, TrackerError> {
	let password = password.to_string();
	tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
		.await
		.map_err(|e| TrackerError::Internal(e.to_string()))?
		.map_err(|e| TrackerError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a bcrypt hash. A malformed hash never matches.
pub(crate) async fn verify_password(password: &str, hash: &str) -> Result<bool, TrackerError> {
	let password = password.to_string();
	let hash = hash.to_string();
	tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
		.await
		.map_err(|e| TrackerError::Internal(e.to_string()))
}

pub struct AuthHandler {
	storage: Arc<StorageService>,
	signer: SessionSigner,
	hash_cost: u32,
}

impl AuthHandler {
	pub fn new(storage: Arc<StorageService>, signer: SessionSigner, hash_cost: u32) -> Self {
		Self {
			storage,
			signer,
			hash_cost,
		}
	}

	/// Lifetime of newly issued tokens.
	pub fn token_ttl(&self) -> chrono::Duration {
		self.signer.ttl()
	}

	#[instrument(skip_all)]
	pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, TrackerError> {
		let email = normalize_email(&request.email);
		if email.is_empty() || request.password.is_empty() {
			return Err(validation("Email and password are required"));
		}

		let users: Vec<User> = self.storage.retrieve_all(StorageKey::Users).await?;
		let Some(user) = users.into_iter().find(|u| u.email == email) else {
			tracing::info!("Login failed: unknown email");
			return Err(unauthorized("Invalid email or password"));
		};
		if !verify_password(&request.password, &user.password_hash).await? {
			tracing::info!(user_id = %truncate_id(&user.id), "Login failed: wrong password");
			return Err(unauthorized("Invalid email or password"));
		}
		if !user.is_active {
			return Err(unauthorized("Account is inactive"));
		}

		let (token, claims) = self
			.signer
			.issue(&user.id, Utc::now())
			.map_err(|e| TrackerError::Internal(e.to_string()))?;

		let snapshot = Snapshot::load(&self.storage).await?;
		let view = snapshot.user_view_with_department(&user);
		tracing::info!(user_id = %truncate_id(&user.id), "User logged in");

		Ok(LoginOutcome {
			token,
			claims,
			response: LoginResponse {
				message: "Login successful".to_string(),
				user: view,
			},
		})
	}

	/// Resolves the actor behind a session token.
	pub async fn authenticate(&self, token: Option<&str>) -> Result<Actor, TrackerError> {
		let Some(token) = token.filter(|t| !t.is_empty()) else {
			return Err(unauthorized("Authentication required"));
		};
		let claims = self
			.signer
			.verify(token, Utc::now())
			.map_err(|e| unauthorized(e.to_string()))?;

		if self
			.storage
			.exists(StorageKey::RevokedSessions, &claims.nonce)
			.await?
		{
			return Err(unauthorized(TokenError::BadSignature.to_string()));
		}

		self.resolve_actor(&claims.user_id).await
	}

	/// Loads an active user with the workflow roles they hold.
	pub async fn resolve_actor(&self, user_id: &str) -> Result<Actor, TrackerError> {
		let user: Option<User> = self.storage.find(StorageKey::Users, user_id).await?;
		let Some(user) = user.filter(|u| u.is_active) else {
			return Err(unauthorized("User not found or inactive"));
		};

		let (approvers, technicians) = tokio::try_join!(
			self.storage.retrieve_all::<Approver>(StorageKey::Approvers),
			self.storage.retrieve_all::<Technician>(StorageKey::Technicians),
		)?;
		let approver = approvers
			.into_iter()
			.find(|a| a.user_id == user.id && a.is_active);
		let technician = technicians
			.into_iter()
			.find(|t| t.user_id == user.id && t.is_active);

		Ok(Actor {
			user,
			approver,
			technician,
		})
	}

	/// Revokes the session behind `token`. Logging out with a missing or
	/// already invalid token still succeeds.
	#[instrument(skip_all)]
	pub async fn logout(&self, token: Option<&str>) -> Result<MessageResponse, TrackerError> {
		let now = Utc::now();
		if let Some(claims) = token.and_then(|t| self.signer.verify(t, now).ok()) {
			let marker = RevokedSession {
				user_id: claims.user_id.clone(),
				revoked_at: now,
			};
			self.storage
				.store_with_ttl(
					StorageKey::RevokedSessions,
					&claims.nonce,
					&marker,
					Some(claims.remaining(now)),
				)
				.await?;
			tracing::info!(user_id = %truncate_id(&claims.user_id), "Session revoked");
		}
		Ok(MessageResponse::new("Logout successful"))
	}

	pub async fn check_login(&self, actor: &Actor) -> Result<SessionResponse, TrackerError> {
		let snapshot = Snapshot::load(&self.storage).await?;
		Ok(SessionResponse {
			authenticated: true,
			user: snapshot.user_view_with_department(&actor.user),
		})
	}

	#[instrument(skip_all, fields(user_id = %truncate_id(actor.id())))]
	pub async fn change_password(
		&self,
		actor: &Actor,
		request: ChangePasswordRequest,
	) -> Result<MessageResponse, TrackerError> {
		if request.current_password.is_empty() || request.new_password.is_empty() {
			return Err(validation(
				"Current password and new password are required",
			));
		}
		request
			.validate()
			.map_err(|e| validation(validation_message(&e)))?;

		let mut user: User = self.storage.retrieve(StorageKey::Users, actor.id()).await?;
		if !verify_password(&request.current_password, &user.password_hash).await? {
			return Err(unauthorized("Current password is incorrect"));
		}

		user.password_hash = hash_password(&request.new_password, self.hash_cost).await?;
		user.updated_at = Utc::now();
		self.storage
			.update(StorageKey::Users, &user.id, &user)
			.await?;

		tracing::info!("Password changed");
		Ok(MessageResponse::new("Password changed successfully"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::Harness;

	#[tokio::test]
	async fn test_login_issues_usable_token() {
		let h = Harness::new().await;
		let user = h.user("Driver@Example.com", None).await;

		let outcome = h
			.engine
			.auth()
			.login(LoginRequest {
				email: "  DRIVER@example.com ".into(),
				password: Harness::PASSWORD.into(),
			})
			.await
			.unwrap();
		assert_eq!(outcome.response.message, "Login successful");
		assert_eq!(outcome.response.user.id, user.id());

		let actor = h
			.engine
			.auth()
			.authenticate(Some(&outcome.token))
			.await
			.unwrap();
		assert_eq!(actor.id(), user.id());
	}

	#[tokio::test]
	async fn test_login_failures() {
		let h = Harness::new().await;
		let user = h.user("driver@example.com", None).await;

		let err = h
			.engine
			.auth()
			.login(LoginRequest {
				email: "driver@example.com".into(),
				password: String::new(),
			})
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Email and password are required");

		let err = h
			.engine
			.auth()
			.login(LoginRequest {
				email: "driver@example.com".into(),
				password: "wrong-password".into(),
			})
			.await
			.unwrap_err();
		assert_eq!(err.status_code(), 401);
		assert_eq!(err.to_string(), "Invalid email or password");

		h.deactivate(user.id()).await;
		let err = h
			.engine
			.auth()
			.login(LoginRequest {
				email: "driver@example.com".into(),
				password: Harness::PASSWORD.into(),
			})
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Account is inactive");
	}

	#[tokio::test]
	async fn test_authenticate_failures() {
		let h = Harness::new().await;
		let auth = h.engine.auth();

		let err = auth.authenticate(None).await.unwrap_err();
		assert_eq!(err.to_string(), "Authentication required");

		let err = auth.authenticate(Some("v1.abc.def")).await.unwrap_err();
		assert_eq!(err.status_code(), 401);
		assert_eq!(err.to_string(), "Invalid token");

		let user = h.user("gone@example.com", None).await;
		let token = h.token_for(user.id());
		h.deactivate(user.id()).await;
		let err = auth.authenticate(Some(&token)).await.unwrap_err();
		assert_eq!(err.to_string(), "User not found or inactive");
	}

	#[tokio::test]
	async fn test_logout_revokes_session() {
		let h = Harness::new().await;
		let user = h.user("driver@example.com", None).await;
		let token = h.token_for(user.id());
		let auth = h.engine.auth();

		assert!(auth.authenticate(Some(&token)).await.is_ok());
		let response = auth.logout(Some(&token)).await.unwrap();
		assert_eq!(response.message, "Logout successful");
		assert_eq!(
			auth.authenticate(Some(&token)).await.unwrap_err().to_string(),
			"Invalid token"
		);

		// a fresh login is unaffected
		let other = h.token_for(user.id());
		assert!(auth.authenticate(Some(&other)).await.is_ok());
		assert!(auth.logout(None).await.is_ok());
	}

	#[tokio::test]
	async fn test_change_password() {
		let h = Harness::new().await;
		let user = h.user("driver@example.com", None).await;
		let auth = h.engine.auth();

		let err = auth
			.change_password(
				&user,
				ChangePasswordRequest {
					current_password: Harness::PASSWORD.into(),
					new_password: "short".into(),
				},
			)
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "New password must be at least 8 characters");

		let err = auth
			.change_password(
				&user,
				ChangePasswordRequest {
					current_password: "not-the-password".into(),
					new_password: "new-password-1".into(),
				},
			)
			.await
			.unwrap_err();
		assert_eq!(err.status_code(), 401);
		assert_eq!(err.to_string(), "Current password is incorrect");

		let ok = auth
			.change_password(
				&user,
				ChangePasswordRequest {
					current_password: Harness::PASSWORD.into(),
					new_password: "new-password-1".into(),
				},
			)
			.await
			.unwrap();
		assert_eq!(ok.message, "Password changed successfully");

		let login = auth
			.login(LoginRequest {
				email: "driver@example.com".into(),
				password: "new-password-1".into(),
			})
			.await;
		assert!(login.is_ok());
	}

	#[tokio::test]
	async fn test_check_login_reports_roles() {
		let h = Harness::new().await;
		let dept = h.department("Field").await;
		let user = h.user("boss@example.com", Some(&dept.id)).await;
		h.make_approver(user.id(), &[]).await;
		let actor = h.actor(user.id()).await;

		let session = h.engine.auth().check_login(&actor).await.unwrap();
		assert!(session.authenticated);
		assert!(session.user.is_approver);
		assert_eq!(session.user.department.map(|d| d.name), Some("Field".to_string()));
	}
}
