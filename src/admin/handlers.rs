use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::admin::dto::{AdminLoginRequest, AdminLoginResponse, AdminProfile};
use crate::admin::repo::Category;
use crate::admin::service;
use crate::auth::dto::{AuthUrlResponse, OAuthCallbackRequest};
use crate::auth::jwt::{AdminUser, JwtKeys};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/profile", get(profile))
        .route("/admin/categories", get(categories))
        .route("/admin/google/auth-url", get(google_auth_url))
        .route("/admin/google/callback", post(google_callback))
}

fn admin_redirect_uri(state: &AppState) -> String {
    format!("{}/api/admin/google/callback", state.config.api_url)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let response = service::login(&state.db, &keys, &payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, admin))]
pub async fn profile(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<AdminProfile>, ApiError> {
    let profile = service::profile(&state.db, admin.sub).await?;
    Ok(Json(profile))
}

#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(Category::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn google_auth_url(
    State(state): State<AppState>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    let auth_url = state.identity.auth_url(&admin_redirect_uri(&state));
    Ok(Json(AuthUrlResponse { auth_url }))
}

#[instrument(skip(state, payload))]
pub async fn google_callback(
    State(state): State<AppState>,
    Json(payload): Json<OAuthCallbackRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    if payload.code.is_empty() {
        return Err(ApiError::Validation("authorization code is required".into()));
    }
    let keys = JwtKeys::from_ref(&state);
    let response = service::google_callback(
        &state.db,
        state.identity.as_ref(),
        &keys,
        &payload.code,
        &admin_redirect_uri(&state),
    )
    .await?;
    Ok(Json(response))
}
