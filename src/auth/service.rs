use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::code::issue_code;
use crate::auth::dto::{LoginRequest, PublicUser, RegisterRequest, VerifyRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, is_provider_sentinel, verify_password};
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::notify::Notifier;
use crate::oauth::IdentityProvider;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub enum LoginOutcome {
    Session { token: String, user: PublicUser },
    /// Account exists but the address is unconfirmed; a code was (re)sent.
    Pending,
}

pub enum VerifyOutcome {
    Verified,
    AlreadyVerified,
}

fn public(user: &User) -> PublicUser {
    PublicUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        photo: user.photo.clone(),
    }
}

/// Register a new account and send it a verification code.
///
/// The row is persisted before the send, and stays if the send fails; the
/// next login attempt retries delivery.
pub async fn register(
    db: &PgPool,
    notifier: &dyn Notifier,
    req: &RegisterRequest,
) -> Result<i64, ApiError> {
    let name = req.name.trim();
    let email = req.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "name, email and password are required".into(),
        ));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::Validation("invalid email address".into()));
    }

    if User::find_by_email(db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&req.password)?;
    let (code, expires) = issue_code();
    let user = User::create(db, name, &email, &hash, req.photo.as_deref(), &code, expires).await?;

    notifier
        .send_verification_code(&email, &code)
        .await
        .map_err(ApiError::Notifier)?;

    info!(user_id = user.id, email = %email, "user registered, verification pending");
    Ok(user.id)
}

/// The outstanding code, if one exists and has not expired. Valid strictly
/// before the expiry instant.
pub(crate) fn current_code(user: &User, now: OffsetDateTime) -> Option<&str> {
    match (&user.verification_code, user.verification_expires) {
        (Some(code), Some(expires)) if now < expires => Some(code),
        _ => None,
    }
}

/// Password login. Unverified accounts never get a session: the code is
/// reused while valid, rotated once expired, and always resent, so a retrying
/// client always holds a deliverable code.
pub async fn login(
    db: &PgPool,
    notifier: &dyn Notifier,
    keys: &JwtKeys,
    req: &LoginRequest,
) -> Result<LoginOutcome, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("email and password are required".into()));
    }

    let user = User::find_by_email(db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("no account with this email".into()))?;

    if is_provider_sentinel(&user.password) {
        warn!(user_id = user.id, "password login on provider-linked account");
        return Err(ApiError::ProviderOnly);
    }
    if !verify_password(&req.password, &user.password)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    if !user.verified {
        let now = OffsetDateTime::now_utc();
        let code = match current_code(&user, now) {
            Some(code) => code.to_string(),
            None => {
                let (code, expires) = issue_code();
                User::rotate_code(db, user.id, &code, expires).await?;
                code
            }
        };
        notifier
            .send_verification_code(&user.email, &code)
            .await
            .map_err(ApiError::Notifier)?;
        info!(user_id = user.id, "login before verification, code resent");
        return Ok(LoginOutcome::Pending);
    }

    let token = keys.sign_user(user.id, &user.email)?;
    info!(user_id = user.id, "user logged in");
    Ok(LoginOutcome::Session {
        token,
        user: public(&user),
    })
}

/// Decide a verification attempt against a loaded user row. Pure, so the
/// branch ordering (idempotency, then match, then expiry) is testable.
pub(crate) fn check_code(
    user: &User,
    submitted: &str,
    now: OffsetDateTime,
) -> Result<VerifyOutcome, ApiError> {
    if user.verified {
        // Idempotent: the submitted code is not consulted.
        return Ok(VerifyOutcome::AlreadyVerified);
    }
    match (&user.verification_code, user.verification_expires) {
        (Some(code), _) if code != submitted => Err(ApiError::InvalidCode),
        // Checked only after the code matches, for the more specific error.
        (Some(_), Some(expires)) if now >= expires => Err(ApiError::ExpiredCode),
        (Some(_), Some(_)) => Ok(VerifyOutcome::Verified),
        _ => Err(ApiError::InvalidCode),
    }
}

pub async fn verify_email(db: &PgPool, req: &VerifyRequest) -> Result<VerifyOutcome, ApiError> {
    let email = req.email.trim().to_lowercase();
    let code = req.code.trim();
    if email.is_empty() || code.is_empty() {
        return Err(ApiError::Validation("email and code are required".into()));
    }

    let user = User::find_by_email(db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("no account with this email".into()))?;

    match check_code(&user, code, OffsetDateTime::now_utc())? {
        VerifyOutcome::AlreadyVerified => Ok(VerifyOutcome::AlreadyVerified),
        VerifyOutcome::Verified => {
            User::mark_verified(db, user.id).await?;
            info!(user_id = user.id, "email verified");
            Ok(VerifyOutcome::Verified)
        }
    }
}

/// OAuth login. First sight of an email auto-provisions a pre-verified
/// account; an existing account is left untouched and only matched.
pub async fn google_login(
    db: &PgPool,
    provider: &dyn IdentityProvider,
    keys: &JwtKeys,
    code: &str,
    redirect_uri: &str,
) -> Result<(String, PublicUser), ApiError> {
    let profile = provider
        .exchange_for_profile(code, redirect_uri)
        .await
        .map_err(ApiError::ProviderAuth)?;

    let email = profile.email.trim().to_lowercase();
    let user = match User::find_by_email(db, &email).await? {
        Some(user) => user,
        None => {
            let user =
                User::create_from_provider(db, &profile.name, &email, profile.picture.as_deref())
                    .await?;
            info!(user_id = user.id, "user auto-provisioned from provider");
            user
        }
    };

    let token = keys.sign_user(user.id, &user.email)?;
    info!(user_id = user.id, "google login");
    Ok((token, public(&user)))
}

pub async fn profile(db: &PgPool, email: &str) -> Result<PublicUser, ApiError> {
    User::find_public_by_email(db, &email.trim().to_lowercase())
        .await?
        .ok_or_else(|| ApiError::NotFound("no account with this email".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn user(
        verified: bool,
        code: Option<&str>,
        expires: Option<OffsetDateTime>,
    ) -> User {
        User {
            id: 1,
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password: "$argon2id$fake".into(),
            photo: None,
            verified,
            verification_code: code.map(str::to_string),
            verification_expires: expires,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("ana@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
    }

    #[test]
    fn current_code_reuses_unexpired_code() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, Some("1234567"), Some(now + Duration::minutes(5)));
        assert_eq!(current_code(&u, now), Some("1234567"));
    }

    #[test]
    fn current_code_is_invalid_at_the_expiry_instant() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, Some("1234567"), Some(now));
        assert_eq!(current_code(&u, now), None);
    }

    #[test]
    fn current_code_rotates_expired_or_missing_codes() {
        let now = OffsetDateTime::now_utc();
        let expired = user(false, Some("1234567"), Some(now - Duration::minutes(1)));
        assert_eq!(current_code(&expired, now), None);
        let missing = user(false, None, None);
        assert_eq!(current_code(&missing, now), None);
    }

    #[test]
    fn check_code_short_circuits_verified_users_even_with_wrong_code() {
        let now = OffsetDateTime::now_utc();
        let u = user(true, None, None);
        assert!(matches!(
            check_code(&u, "0000000", now),
            Ok(VerifyOutcome::AlreadyVerified)
        ));
    }

    #[test]
    fn check_code_rejects_mismatch_before_expiry_check() {
        let now = OffsetDateTime::now_utc();
        // Code both wrong and expired: mismatch wins.
        let u = user(false, Some("1234567"), Some(now - Duration::minutes(1)));
        assert!(matches!(
            check_code(&u, "7654321", now),
            Err(ApiError::InvalidCode)
        ));
    }

    #[test]
    fn check_code_reports_expiry_when_the_code_matches() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, Some("1234567"), Some(now - Duration::minutes(1)));
        assert!(matches!(
            check_code(&u, "1234567", now),
            Err(ApiError::ExpiredCode)
        ));
        // Exactly at the expiry instant is already too late.
        let u = user(false, Some("1234567"), Some(now));
        assert!(matches!(
            check_code(&u, "1234567", now),
            Err(ApiError::ExpiredCode)
        ));
    }

    #[test]
    fn check_code_accepts_a_matching_unexpired_code() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, Some("1234567"), Some(now + Duration::minutes(5)));
        assert!(matches!(
            check_code(&u, "1234567", now),
            Ok(VerifyOutcome::Verified)
        ));
    }

    #[test]
    fn check_code_rejects_when_no_code_is_outstanding() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, None, None);
        assert!(matches!(
            check_code(&u, "1234567", now),
            Err(ApiError::InvalidCode)
        ));
    }

    #[test]
    fn public_projection_drops_sensitive_fields() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, Some("1234567"), Some(now));
        let json = serde_json::to_value(public(&u)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("verification_code").is_none());
        assert!(json.get("verified").is_none());
    }
}
