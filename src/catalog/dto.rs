use serde::Deserialize;

/// Request body for creating a course.
#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: String,
    pub duration: String,
    #[serde(default)]
    pub price_cents: i64,
    pub image: String,
    pub course_level: String,
}
