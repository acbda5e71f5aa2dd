use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Course catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub price_cents: i64,
    pub image: String,
    pub course_level: String,
    pub created_at: OffsetDateTime,
}

impl Course {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, duration, price_cents, image, course_level, created_at
            FROM courses
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(courses)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, duration, price_cents, image, course_level, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(course)
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        description: &str,
        duration: &str,
        price_cents: i64,
        image: &str,
        course_level: &str,
    ) -> anyhow::Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, duration, price_cents, image, course_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, duration, price_cents, image, course_level, created_at
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(duration)
        .bind(price_cents)
        .bind(image)
        .bind(course_level)
        .fetch_one(db)
        .await?;
        Ok(course)
    }

    /// Delete a course, returning the removed row so the caller can clean up
    /// its hosted image.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            DELETE FROM courses
            WHERE id = $1
            RETURNING id, title, description, duration, price_cents, image, course_level, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(course)
    }
}
