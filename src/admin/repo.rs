use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::admin::dto::AdminProfile;
use crate::auth::password::PROVIDER_SENTINEL;

/// Admin record. Trusted at creation time; no verification flow.
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password: String, // argon2 hash or the provider sentinel
    pub role: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub kind: Option<String>,
    pub name: Option<String>,
}

impl Admin {
    pub async fn find_by_username(
        db: &PgPool,
        username: &str,
    ) -> Result<Option<Admin>, sqlx::Error> {
        sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, username, email, password, role, created_at
            FROM admins
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Admin>, sqlx::Error> {
        sqlx::query_as::<_, Admin>(
            r#"
            SELECT id, username, email, password, role, created_at
            FROM admins
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_profile(db: &PgPool, id: i64) -> Result<Option<AdminProfile>, sqlx::Error> {
        sqlx::query_as::<_, AdminProfile>(
            r#"
            SELECT id, username, email, role
            FROM admins
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Auto-provision an admin linked to the external identity provider.
    pub async fn create_from_provider(
        db: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<Admin, sqlx::Error> {
        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (username, email, password, role)
            VALUES ($1, $2, $3, 'admin')
            RETURNING id, username, email, password, role, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(PROVIDER_SENTINEL)
        .fetch_one(db)
        .await
    }

    /// Seed the bootstrap admin once, only while the table is empty.
    pub async fn seed_if_empty(
        db: &PgPool,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO admins (username, password, role)
            SELECT $1, $2, 'admin'
            WHERE NOT EXISTS (SELECT 1 FROM admins)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Category {
    pub async fn list(db: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, kind, name
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(db)
        .await
    }
}
