//! Signed session tokens.
//!
//! A token is `v1.{payload}.{signature}`. The payload is the JSON claims
//! encoded as URL-safe base64 without padding; the signature is an
//! HMAC-SHA256 of the encoded payload under the configured secret. Each token
//! carries a random nonce so a single session can be revoked on logout.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracker_types::SecretString;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION: &str = "v1";
const MAX_TOKEN_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
	#[error("Invalid token")]
	Malformed,
	#[error("Invalid token")]
	BadSignature,
	#[error("Token expired")]
	Expired,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
	pub user_id: String,
	/// Expiry as a unix timestamp in seconds.
	pub exp: i64,
	pub nonce: String,
}

impl SessionClaims {
	/// Seconds left before expiry, zero once expired.
	pub fn remaining(&self, now: DateTime<Utc>) -> std::time::Duration {
		std::time::Duration::from_secs(self.exp.saturating_sub(now.timestamp()).max(0) as u64)
	}
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionSigner {
	secret: SecretString,
	ttl: Duration,
}

impl SessionSigner {
	pub fn new(secret: SecretString, ttl: Duration) -> Self {
		Self { secret, ttl }
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	fn mac(&self) -> Result<HmacSha256, TokenError> {
		HmacSha256::new_from_slice(self.secret.expose_bytes()).map_err(|_| TokenError::Malformed)
	}

	/// Issues a token for `user_id` valid for the configured lifetime.
	pub fn issue(
		&self,
		user_id: &str,
		now: DateTime<Utc>,
	) -> Result<(String, SessionClaims), TokenError> {
		let claims = SessionClaims {
			user_id: user_id.to_string(),
			exp: (now + self.ttl).timestamp(),
			nonce: uuid::Uuid::new_v4().simple().to_string(),
		};
		let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Malformed)?;
		let payload_part = URL_SAFE_NO_PAD.encode(payload);

		let mut mac = self.mac()?;
		mac.update(payload_part.as_bytes());
		let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

		Ok((
			format!("{}.{}.{}", TOKEN_VERSION, payload_part, sig_part),
			claims,
		))
	}

	/// Verifies the signature and expiry of `token` and returns its claims.
	pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
		if token.len() > MAX_TOKEN_LEN {
			return Err(TokenError::Malformed);
		}
		let mut parts = token.split('.');
		let (Some(version), Some(payload_part), Some(sig_part), None) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(TokenError::Malformed);
		};
		if version != TOKEN_VERSION {
			return Err(TokenError::Malformed);
		}

		let signature = URL_SAFE_NO_PAD
			.decode(sig_part)
			.map_err(|_| TokenError::Malformed)?;
		let mut mac = self.mac()?;
		mac.update(payload_part.as_bytes());
		mac.verify_slice(&signature)
			.map_err(|_| TokenError::BadSignature)?;

		let payload = URL_SAFE_NO_PAD
			.decode(payload_part)
			.map_err(|_| TokenError::Malformed)?;
		let claims: SessionClaims =
			serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

		if claims.exp <= now.timestamp() {
			return Err(TokenError::Expired);
		}
		Ok(claims)
	}
}
