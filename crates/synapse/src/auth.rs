//! Bearer-token authentication.
//!
//! The HTTP API authenticates with self-issued HMAC-SHA256 tokens instead
//! of an external identity provider. A token is
//! `base64url(user_id:expires_at:hex_signature)` where the signature
//! covers `user_id:expires_at` and is keyed by the `SYNAPSE_SECRET`
//! environment variable. Tokens are minted with `synapse token <user-id>`.
//!
//! Signature comparison goes through the `hmac` crate's constant-time
//! `verify_slice`.

use anyhow::{anyhow, bail, Result};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::server::{unauthorized, AppError, AppState};

type HmacSha256 = Hmac<Sha256>;

/// Name of the environment variable holding the signing secret.
pub const SECRET_ENV: &str = "SYNAPSE_SECRET";

/// Read the signing secret from the environment.
pub fn load_secret() -> Result<String> {
    let secret = std::env::var(SECRET_ENV)
        .map_err(|_| anyhow!("{} environment variable not set", SECRET_ENV))?;
    if secret.is_empty() {
        bail!("{} must not be empty", SECRET_ENV);
    }
    Ok(secret)
}

fn sign(secret: &str, payload: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Mint a bearer token for `user_id`, valid for `ttl_secs` from now.
pub fn issue_token(secret: &str, user_id: &str, ttl_secs: i64) -> String {
    let expires_at = chrono::Utc::now().timestamp() + ttl_secs;
    let payload = format!("{}:{}", user_id, expires_at);
    let signature = hex::encode(sign(secret, &payload));
    URL_SAFE_NO_PAD.encode(format!("{}:{}", payload, signature))
}

/// Verify a bearer token and return the user id it was issued for.
///
/// Rejects malformed, tampered, and expired tokens.
pub fn verify_token(secret: &str, token: &str) -> Result<String> {
    let decoded = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| anyhow!("malformed token"))?;
    let decoded = String::from_utf8(decoded).map_err(|_| anyhow!("malformed token"))?;

    // user_id may itself contain ':'; the last two segments are the
    // expiry and the signature.
    let mut parts = decoded.rsplitn(3, ':');
    let signature = parts.next().ok_or_else(|| anyhow!("malformed token"))?;
    let expires_at: i64 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow!("malformed token"))?;
    let user_id = parts.next().ok_or_else(|| anyhow!("malformed token"))?;
    if user_id.is_empty() {
        bail!("malformed token");
    }

    let signature = hex::decode(signature).map_err(|_| anyhow!("malformed token"))?;

    let payload = format!("{}:{}", user_id, expires_at);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| anyhow!("invalid token signature"))?;

    if expires_at < chrono::Utc::now().timestamp() {
        bail!("token expired");
    }

    Ok(user_id.to_string())
}

/// The authenticated caller, extracted from the `Authorization` header.
pub struct AuthUser(pub String);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| unauthorized("missing bearer token"))?;

        let user_id = verify_token(&state.auth_secret, token)
            .map_err(|e| unauthorized(e.to_string()))?;

        Ok(AuthUser(user_id))
    }
}
