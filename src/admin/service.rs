use sqlx::PgPool;
use tracing::{info, warn};

use crate::admin::dto::{AdminLoginRequest, AdminLoginResponse, AdminProfile};
use crate::admin::repo::Admin;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{is_provider_sentinel, verify_password};
use crate::error::ApiError;
use crate::oauth::IdentityProvider;

fn session(keys: &JwtKeys, admin: &Admin) -> Result<AdminLoginResponse, ApiError> {
    // Admins without an email claim their username instead.
    let email = admin.email.as_deref().unwrap_or(&admin.username);
    let token = keys.sign_admin(admin.id, email, &admin.role)?;
    Ok(AdminLoginResponse {
        success: true,
        token,
        id: admin.id,
        username: admin.username.clone(),
        role: admin.role.clone(),
    })
}

/// Password login for the separate admin identity space. Same shape as the
/// user flow minus verification.
pub async fn login(
    db: &PgPool,
    keys: &JwtKeys,
    req: &AdminLoginRequest,
) -> Result<AdminLoginResponse, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".into(),
        ));
    }

    let admin = Admin::find_by_username(db, username)
        .await?
        .ok_or_else(|| ApiError::NotFound("no admin with this username".into()))?;

    if is_provider_sentinel(&admin.password) {
        warn!(admin_id = admin.id, "password login on provider-linked admin");
        return Err(ApiError::ProviderOnly);
    }
    if !verify_password(&req.password, &admin.password)? {
        warn!(admin_id = admin.id, "admin login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(admin_id = admin.id, "admin logged in");
    session(keys, &admin)
}

/// OAuth login for admins; the first external login auto-provisions a
/// sentinel-password record.
pub async fn google_callback(
    db: &PgPool,
    provider: &dyn IdentityProvider,
    keys: &JwtKeys,
    code: &str,
    redirect_uri: &str,
) -> Result<AdminLoginResponse, ApiError> {
    let profile = provider
        .exchange_for_profile(code, redirect_uri)
        .await
        .map_err(ApiError::ProviderAuth)?;

    let email = profile.email.trim().to_lowercase();
    let admin = match Admin::find_by_email(db, &email).await? {
        Some(admin) => admin,
        None => {
            let admin = Admin::create_from_provider(db, &profile.name, &email).await?;
            info!(admin_id = admin.id, "admin auto-provisioned from provider");
            admin
        }
    };

    info!(admin_id = admin.id, "admin google login");
    session(keys, &admin)
}

pub async fn profile(db: &PgPool, id: i64) -> Result<AdminProfile, ApiError> {
    Admin::find_profile(db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("admin not found".into()))
}
