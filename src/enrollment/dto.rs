use serde::Deserialize;
use uuid::Uuid;

/// Request body for enrolling a user in a course.
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub user_id: Uuid,
    pub course_id: Uuid,
}
