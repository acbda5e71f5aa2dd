use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::jwt::AdminUser,
    catalog::{dto::CreateCourseRequest, repo::Course},
    error::AppError,
    media::object_key_from_url,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/:id", get(get_course))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/courses", post(create_course))
        .route("/admin/courses/:id", delete(delete_course))
}

#[instrument(skip(state))]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = Course::list(&state.db).await?;
    Ok(Json(courses))
}

#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = Course::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".into()))?;
    Ok(Json(course))
}

#[instrument(skip(state, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<Json<Course>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    if payload.image.trim().is_empty() {
        return Err(AppError::Validation("image is required".into()));
    }
    if payload.price_cents < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }

    let course = Course::create(
        &state.db,
        payload.title.trim(),
        &payload.description,
        &payload.duration,
        payload.price_cents,
        payload.image.trim(),
        &payload.course_level,
    )
    .await?;

    info!(course_id = %course.id, created_by = %admin_id, "course created");
    Ok(Json(course))
}

#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, AppError> {
    let course = Course::delete(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".into()))?;

    // Hosted image cleanup is best-effort; the course row is already gone.
    if let Some(key) = object_key_from_url(&course.image) {
        if let Err(e) = state.media.delete_object(&key).await {
            warn!(error = %e, %key, "course image delete failed");
        }
    }

    info!(course_id = %course.id, deleted_by = %admin_id, "course deleted");
    Ok(Json(course))
}
