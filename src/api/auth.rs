//! Password hashing, bearer tokens and the authenticated-user extractor.
//!
//! Passwords are stored as `salt$base64url(hmac_sha256(salt, password))`.
//!
//! A token is `base64url(claims) "." base64url(hmac_sha256(secret, payload))`,
//! where the claims are `{sub, role, exp}` with `exp` in unix seconds. Tokens
//! are stateless; deactivating a user revokes their tokens because the
//! extractor reloads the user on every request.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::db;
use crate::error::{PortalError, PortalResult};
use crate::models::{Role, User};

use super::response::ApiErrorResponse;
use super::state::AppState;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(key: &[u8], message: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key).ok()?;
    mac.update(message);
    Some(mac)
}

/// base64url HMAC-SHA256 of `message` under `key`.
fn mac_base64(key: &[u8], message: &[u8]) -> Option<String> {
    mac_for(key, message).map(|mac| URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Checks a base64url signature against the HMAC of `message` in constant time.
fn verify_mac(key: &[u8], message: &[u8], signature: &str) -> bool {
    let (Ok(expected), Some(mac)) = (URL_SAFE_NO_PAD.decode(signature), mac_for(key, message)) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}

/// Hashes a password with a fresh random salt.
///
/// # Example
///
/// ```
/// use staffing_portal::api::{hash_password, verify_password};
///
/// let stored = hash_password("correct horse").unwrap();
/// assert!(verify_password("correct horse", &stored));
/// assert!(!verify_password("battery staple", &stored));
/// ```
pub fn hash_password(password: &str) -> PortalResult<String> {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = mac_base64(salt.as_bytes(), password.as_bytes())
        .ok_or_else(|| PortalError::validation("password", "could not be hashed"))?;
    Ok(format!("{salt}${digest}"))
}

/// Checks a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => verify_mac(salt.as_bytes(), password.as_bytes(), digest),
        None => false,
    }
}

/// The signed content of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    /// Role at issue time.
    pub role: Role,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Signs and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Creates a signer for the given secret and token lifetime.
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    fn sign(&self, payload: &str) -> PortalResult<String> {
        mac_base64(self.secret.as_bytes(), payload.as_bytes())
            .ok_or_else(|| PortalError::unauthorized("token signing key rejected"))
    }

    /// Issues a token for `user`, returning it with its expiry.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> PortalResult<(String, DateTime<Utc>)> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp(),
        };
        let json = serde_json::to_vec(&claims).map_err(|e| PortalError::unauthorized(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload)?;
        Ok((format!("{payload}.{signature}"), expires_at))
    }

    /// Verifies a token's signature and expiry and returns its claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> PortalResult<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| PortalError::unauthorized("malformed token"))?;

        if !verify_mac(self.secret.as_bytes(), payload.as_bytes(), signature) {
            return Err(PortalError::unauthorized("invalid token signature"));
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| PortalError::unauthorized("malformed token"))?;
        let claims: Claims =
            serde_json::from_slice(&json).map_err(|_| PortalError::unauthorized("malformed token"))?;

        if claims.exp <= now.timestamp() {
            return Err(PortalError::unauthorized("token expired"));
        }
        Ok(claims)
    }
}

/// The user behind a request's bearer token.
///
/// Rejects with 401 when the header is missing, the token is invalid or
/// expired, or the user no longer exists or is inactive.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    /// Fails with 403 unless the user is an admin.
    pub fn require_admin(&self) -> PortalResult<()> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(PortalError::forbidden("admin role required"))
        }
    }

    /// Fails with 403 unless the user is an admin or `owner_id` is theirs.
    pub fn require_self_or_admin(&self, owner_id: Option<i64>) -> PortalResult<()> {
        if self.0.is_admin() || owner_id == Some(self.0.id) {
            Ok(())
        } else {
            Err(PortalError::forbidden("not your record"))
        }
    }

    /// The id to scope list queries by: `None` for admins, the user's own id otherwise.
    pub fn scope(&self) -> Option<i64> {
        if self.0.is_admin() { None } else { Some(self.0.id) }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| PortalError::unauthorized("missing bearer token"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| PortalError::unauthorized("missing bearer token"))?;

        let claims = state.tokens().verify(token.trim(), Utc::now())?;

        let user = match db::users::get(state.pool(), claims.sub).await {
            Ok(user) => user,
            Err(PortalError::NotFound { .. }) => {
                return Err(PortalError::unauthorized("unknown user").into());
            }
            Err(other) => return Err(other.into()),
        };
        if !user.active {
            debug!(user_id = user.id, "Rejected token for inactive user");
            return Err(PortalError::unauthorized("account is inactive").into());
        }

        Ok(AuthUser(user))
    }
}
