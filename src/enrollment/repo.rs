use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::catalog::repo::Course;

/// One purchased/unlocked course on a user's account. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub course_id: Uuid,
    pub purchased_at: OffsetDateTime,
}

impl Purchase {
    /// Record an enrollment. The compound primary key turns the duplicate
    /// check into one conditional insert, so two concurrent calls for the
    /// same (user, course) pair cannot both land. Returns false when the
    /// purchase already existed.
    pub async fn insert(db: &PgPool, user_id: Uuid, course_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO purchases (user_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, course_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .execute(db)
        .await
        .context("insert purchase")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists(db: &PgPool, user_id: Uuid, course_id: Uuid) -> anyhow::Result<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT course_id FROM purchases WHERE user_id = $1 AND course_id = $2"#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(db)
        .await
        .context("check purchase")?;
        Ok(row.is_some())
    }

    /// All purchases for a user, in insertion order.
    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Purchase>> {
        let rows = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT course_id, purchased_at
            FROM purchases
            WHERE user_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list purchases")?;
        Ok(rows)
    }

    /// Purchased courses resolved against the catalog, in purchase order.
    /// The inner join drops references whose course has been deleted.
    pub async fn purchased_courses(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Course>> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT c.id, c.title, c.description, c.duration, c.price_cents,
                   c.image, c.course_level, c.created_at
            FROM purchases p
            JOIN courses c ON c.id = p.course_id
            WHERE p.user_id = $1
            ORDER BY p.seq ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list purchased courses")?;
        Ok(rows)
    }
}
