use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::dto::PublicUser;
use crate::auth::password::PROVIDER_SENTINEL;

/// User record in the database. Never serialized directly; clients only see
/// the `PublicUser` projection.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String, // argon2 hash or the provider sentinel
    pub photo: Option<String>,
    pub verified: bool,
    pub verification_code: Option<String>,
    pub verification_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password, photo, verified,
                   verification_code, verification_expires, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Create an unverified user with an outstanding verification code.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        photo: Option<&str>,
        code: &str,
        expires: OffsetDateTime,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, photo, verified,
                               verification_code, verification_expires)
            VALUES ($1, $2, $3, $4, FALSE, $5, $6)
            RETURNING id, name, email, password, photo, verified,
                      verification_code, verification_expires, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(photo)
        .bind(code)
        .bind(expires)
        .fetch_one(db)
        .await
    }

    /// Create a pre-verified user whose identity the provider already vouched
    /// for. Password holds the sentinel, so direct login stays rejected.
    pub async fn create_from_provider(
        db: &PgPool,
        name: &str,
        email: &str,
        photo: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, photo, verified)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, name, email, password, photo, verified,
                      verification_code, verification_expires, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(PROVIDER_SENTINEL)
        .bind(photo)
        .fetch_one(db)
        .await
    }

    /// Replace the outstanding code and its expiry in one statement.
    pub async fn rotate_code(
        db: &PgPool,
        id: i64,
        code: &str,
        expires: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET verification_code = $1, verification_expires = $2
            WHERE id = $3
            "#,
        )
        .bind(code)
        .bind(expires)
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Flip to verified and clear the code atomically.
    pub async fn mark_verified(db: &PgPool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE, verification_code = NULL, verification_expires = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_public_by_email(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<PublicUser>, sqlx::Error> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, name, email, photo
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }
}
