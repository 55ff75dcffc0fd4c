//! JWT access-token validation.
//!
//! Access tokens are HS256-signed JWTs issued by the platform auth
//! service and validated here against the shared secret. This API never
//! issues tokens; [`generate_access_token`] exists for integration
//! tests and local tooling.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use coldwatch_core::types::DbId;

use crate::config::JwtConfig;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's organization id.
    pub org: Uuid,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier for revocation / audit.
    pub jti: String,
}

/// Token lifetime used by [`generate_access_token`].
const TEST_TOKEN_EXPIRY_MINS: i64 = 15;

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    organization_id: Uuid,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        org: organization_id,
        exp: now + TEST_TOKEN_EXPIRY_MINS * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature, expiration, and issued-at claims automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
