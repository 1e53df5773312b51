use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Request body for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login either yields a session or a "go check your inbox" indicator.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Session { token: String, user: PublicUser },
    Pending { verify: bool, message: String },
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub email: Option<String>,
}

/// Public part of the user returned to clients. Password and verification
/// fields never appear here.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    #[serde(rename = "authUrl")]
    pub auth_url: String,
}

/// Authorization code posted back from the provider consent screen.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_response_has_token_and_user_only() {
        let response = LoginResponse::Session {
            token: "jwt-token".into(),
            user: PublicUser {
                id: 1,
                name: "Ana".into(),
                email: "ana@x.com".into(),
                photo: None,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "jwt-token");
        assert_eq!(json["user"]["email"], "ana@x.com");
        assert!(json.get("verify").is_none());
        assert!(json["user"].get("password").is_none());
        assert!(json["user"].get("verification_code").is_none());
    }

    #[test]
    fn pending_response_signals_verification() {
        let response = LoginResponse::Pending {
            verify: true,
            message: "check your email".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["verify"], true);
        assert!(json.get("token").is_none());
    }

    #[test]
    fn register_response_uses_camel_case_user_id() {
        let json = serde_json::to_value(RegisterResponse {
            success: true,
            user_id: 9,
        })
        .unwrap();
        assert_eq!(json["userId"], 9);
    }
}
