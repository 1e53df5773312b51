use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub user_ttl_minutes: i64,
    pub admin_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Public base URL of this API, used to build OAuth redirect URIs.
    pub api_url: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub google: GoogleConfig,
    pub admin_username: String,
    /// Plaintext password for the bootstrap admin; hashed before it hits the store.
    /// When unset, no admin is seeded.
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let api_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:5000".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "capela".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "capela-users".into()),
            user_ttl_minutes: std::env::var("JWT_USER_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
            admin_ttl_minutes: std::env::var("JWT_ADMIN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let smtp_username = std::env::var("SMTP_USERNAME")?;
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".into()),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            from: std::env::var("SMTP_FROM").unwrap_or_else(|_| smtp_username.clone()),
            username: smtp_username,
            password: std::env::var("SMTP_PASSWORD")?,
            timeout_secs: std::env::var("SMTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        let google = GoogleConfig {
            client_id: std::env::var("GOOGLE_CLIENT_ID")?,
            client_secret: std::env::var("GOOGLE_CLIENT_SECRET")?,
        };
        let admin_username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
        let admin_password = std::env::var("ADMIN_PASSWORD").ok();
        Ok(Self {
            database_url,
            api_url,
            jwt,
            smtp,
            google,
            admin_username,
            admin_password,
        })
    }
}
