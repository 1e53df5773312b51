use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    AuthUrlResponse, LoginRequest, LoginResponse, OAuthCallbackRequest, ProfileQuery, PublicUser,
    RegisterRequest, RegisterResponse, VerifyRequest, VerifyResponse,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::service::{self, LoginOutcome, VerifyOutcome};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", post(verify))
        .route("/auth/profile", get(profile))
        .route("/auth/google/auth-url", get(google_auth_url))
        .route("/auth/google/callback", post(google_callback))
}

fn user_redirect_uri(state: &AppState) -> String {
    format!("{}/api/auth/google/callback", state.config.api_url)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let user_id = service::register(&state.db, state.notifier.as_ref(), &payload).await?;
    Ok(Json(RegisterResponse {
        success: true,
        user_id,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let outcome = service::login(&state.db, state.notifier.as_ref(), &keys, &payload).await?;
    Ok(Json(match outcome {
        LoginOutcome::Session { token, user } => LoginResponse::Session { token, user },
        LoginOutcome::Pending => LoginResponse::Pending {
            verify: true,
            message: "check your email for the verification code".into(),
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let outcome = service::verify_email(&state.db, &payload).await?;
    Ok(Json(VerifyResponse {
        success: true,
        message: match outcome {
            VerifyOutcome::AlreadyVerified => Some("already verified".into()),
            VerifyOutcome::Verified => None,
        },
    }))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<PublicUser>, ApiError> {
    let email = query
        .email
        .ok_or_else(|| ApiError::Validation("email is required".into()))?;
    let user = service::profile(&state.db, &email).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn google_auth_url(
    State(state): State<AppState>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    let auth_url = state.identity.auth_url(&user_redirect_uri(&state));
    Ok(Json(AuthUrlResponse { auth_url }))
}

#[instrument(skip(state, payload))]
pub async fn google_callback(
    State(state): State<AppState>,
    Json(payload): Json<OAuthCallbackRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if payload.code.is_empty() {
        return Err(ApiError::Validation("authorization code is required".into()));
    }
    let keys = JwtKeys::from_ref(&state);
    let (token, user) = service::google_login(
        &state.db,
        state.identity.as_ref(),
        &keys,
        &payload.code,
        &user_redirect_uri(&state),
    )
    .await?;
    // Provider-confirmed accounts never see the pending branch.
    Ok(Json(LoginResponse::Session { token, user }))
}
