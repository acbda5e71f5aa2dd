use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::jwt::Role;

pub const ORIGIN_USER: &str = "user";
pub const ORIGIN_ADMIN: &str = "admin";

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, not exposed in JSON
    pub name: String,
    pub origin: String, // "user" or "admin" registration channel
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn role(&self) -> Role {
        if self.origin == ORIGIN_ADMIN {
            Role::Admin
        } else {
            Role::User
        }
    }

    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, origin, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, origin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        name: &str,
        origin: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, origin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, origin, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(origin)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, origin, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Delete a user by id, returning the deleted id if it existed.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let deleted: Option<(Uuid,)> =
            sqlx::query_as(r#"DELETE FROM users WHERE id = $1 RETURNING id"#)
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(deleted.map(|(id,)| id))
    }

    /// Replace the stored password hash. Returns false when the email is
    /// unknown.
    pub async fn update_password(db: &PgPool, email: &str, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE email = $1"#)
            .bind(email)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Short-lived email verification code. At most one live code per email
/// (primary key); the 5-minute TTL lives in the query predicates so an
/// expired row is unusable even before cleanup.
pub struct OtpCode;

impl OtpCode {
    /// Store a fresh code, superseding any prior one for this email.
    pub async fn upsert(db: &PgPool, email: &str, code: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (email, code, created_at)
            VALUES ($1, $2, now())
            ON CONFLICT (email)
            DO UPDATE SET code = excluded.code, created_at = excluded.created_at
            "#,
        )
        .bind(email)
        .bind(code)
        .execute(db)
        .await
        .context("upsert otp code")?;
        Ok(())
    }

    /// Atomically consume a live, exactly-matching code. Returns false when
    /// no such code exists (wrong code, expired, or never requested).
    pub async fn consume(db: &PgPool, email: &str, code: &str) -> anyhow::Result<bool> {
        let deleted: Option<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM otp_codes
            WHERE email = $1
              AND code = $2
              AND created_at > now() - interval '5 minutes'
            RETURNING email
            "#,
        )
        .bind(email)
        .bind(code)
        .fetch_optional(db)
        .await
        .context("consume otp code")?;
        Ok(deleted.is_some())
    }

    /// Whether a live (unexpired) code exists for this email at all.
    pub async fn live_exists(db: &PgPool, email: &str) -> anyhow::Result<bool> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT email FROM otp_codes
            WHERE email = $1
              AND created_at > now() - interval '5 minutes'
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("check live otp")?;
        Ok(row.is_some())
    }
}

/// Single-use ticket binding a verified OTP to the subsequent password
/// reset. Only the SHA-256 digest is stored.
pub struct ResetTicket;

impl ResetTicket {
    pub async fn upsert(db: &PgPool, email: &str, token_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tickets (email, token_hash, expires_at)
            VALUES ($1, $2, now() + interval '15 minutes')
            ON CONFLICT (email)
            DO UPDATE SET token_hash = excluded.token_hash, expires_at = excluded.expires_at
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .execute(db)
        .await
        .context("upsert reset ticket")?;
        Ok(())
    }

    /// Atomically consume a live ticket. Returns false for wrong, expired or
    /// already-used tickets alike.
    pub async fn consume(db: &PgPool, email: &str, token_hash: &str) -> anyhow::Result<bool> {
        let deleted: Option<(String,)> = sqlx::query_as(
            r#"
            DELETE FROM password_reset_tickets
            WHERE email = $1
              AND token_hash = $2
              AND expires_at > now()
            RETURNING email
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .fetch_optional(db)
        .await
        .context("consume reset ticket")?;
        Ok(deleted.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_follows_origin_tag() {
        let mut user = User {
            id: Uuid::new_v4(),
            email: "a@b.io".into(),
            password_hash: "hash".into(),
            name: "A".into(),
            origin: ORIGIN_USER.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        assert_eq!(user.role(), Role::User);
        user.origin = ORIGIN_ADMIN.into();
        assert_eq!(user.role(), Role::Admin);
    }

    #[test]
    fn user_serialization_skips_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.io".into(),
            password_hash: "supersecret".into(),
            name: "A".into(),
            origin: ORIGIN_USER.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("supersecret"));
        assert!(json.contains("a@b.io"));
    }
}
