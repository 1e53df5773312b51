use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// Public part of the admin record.
#[derive(Debug, Serialize, FromRow)]
pub struct AdminProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_carries_role_but_no_password() {
        let json = serde_json::to_value(AdminLoginResponse {
            success: true,
            token: "jwt".into(),
            id: 1,
            username: "admin".into(),
            role: "admin".into(),
        })
        .unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("password").is_none());
    }
}
