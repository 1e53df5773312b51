use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// JWT payload asserting an authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,    // account ID
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>, // present only on admin tokens
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub user_ttl: Duration,
    pub admin_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            user_ttl_minutes,
            admin_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            user_ttl: Duration::from_secs((user_ttl_minutes as u64) * 60),
            admin_ttl: Duration::from_secs((admin_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_ttl(
        &self,
        sub: i64,
        email: &str,
        role: Option<&str>,
        ttl: Duration,
    ) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub,
            email: email.to_string(),
            role: role.map(str::to_string),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(account_id = sub, role = ?claims.role, "jwt signed");
        Ok(token)
    }

    /// Session for a verified user. One day.
    pub fn sign_user(&self, id: i64, email: &str) -> anyhow::Result<String> {
        self.sign_with_ttl(id, email, None, self.user_ttl)
    }

    /// Session for an admin, carrying the role claim. Seven days.
    pub fn sign_admin(&self, id: i64, email: &str, role: &str) -> anyhow::Result<String> {
        self.sign_with_ttl(id, email, Some(role), self.admin_ttl)
    }

    /// Malformed signature and elapsed expiry collapse into one error kind:
    /// callers only need "not authenticated".
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ApiError::InvalidToken)?;
        debug!(account_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Extracts and validates a bearer token carrying an admin role claim.
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(ApiError::InvalidToken)?;

        let claims = keys.verify(token)?;
        if claims.role.is_none() {
            warn!(account_id = claims.sub, "user token presented on admin route");
            return Err(ApiError::InvalidToken);
        }
        Ok(AdminUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_user_token() {
        let keys = make_keys();
        let token = keys.sign_user(42, "ana@x.com").expect("sign user");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ana@x.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.role.is_none());
    }

    #[tokio::test]
    async fn admin_token_carries_role_claim() {
        let keys = make_keys();
        let token = keys
            .sign_admin(7, "admin@x.com", "admin")
            .expect("sign admin");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn admin_ttl_outlives_user_ttl() {
        let keys = make_keys();
        let user = keys.verify(&keys.sign_user(1, "u@x.com").unwrap()).unwrap();
        let admin = keys
            .verify(&keys.sign_admin(1, "a@x.com", "admin").unwrap())
            .unwrap();
        assert!(admin.exp > user.exp);
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let mut token = keys.sign_user(42, "ana@x.com").expect("sign user");
        token.push('x');
        assert!(matches!(keys.verify(&token), Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            ..keys.clone()
        };
        let token = other.sign_user(42, "ana@x.com").expect("sign user");
        assert!(matches!(keys.verify(&token), Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: 42,
            email: "ana@x.com".into(),
            role: None,
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize, // well past the default leeway
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(matches!(keys.verify(&token), Err(ApiError::InvalidToken)));
    }
}
