use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{AdminUser, AuthUser, Role},
        repo::User,
    },
    catalog::repo::Course,
    enrollment::{dto::EnrollRequest, repo::Purchase},
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll))
        .route("/admin/users/:id/purchased-courses", get(purchased_courses))
}

/// Direct enrollment. Free courses only for regular users; paid courses are
/// unlocked through the payment webhook or by an admin grant.
#[instrument(skip(state, auth, payload))]
pub async fn enroll(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<EnrollRequest>,
) -> Result<Json<Vec<Purchase>>, AppError> {
    if auth.role != Role::Admin && auth.id != payload.user_id {
        warn!(caller = %auth.id, target = %payload.user_id, "enroll denied for other user");
        return Err(AppError::Unauthorized("cannot enroll another user".into()));
    }

    if User::find_by_id(&state.db, payload.user_id).await?.is_none() {
        return Err(AppError::NotFound("user not found".into()));
    }

    let course = Course::find_by_id(&state.db, payload.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".into()))?;

    if course.price_cents > 0 && auth.role != Role::Admin {
        warn!(user_id = %payload.user_id, course_id = %course.id, "paid course without checkout");
        return Err(AppError::Unauthorized(
            "paid course requires a completed checkout".into(),
        ));
    }

    if !Purchase::insert(&state.db, payload.user_id, payload.course_id).await? {
        return Err(AppError::AlreadyEnrolled);
    }

    info!(user_id = %payload.user_id, course_id = %payload.course_id, "course enrolled");
    let purchases = Purchase::list_for_user(&state.db, payload.user_id).await?;
    Ok(Json(purchases))
}

#[instrument(skip(state))]
pub async fn purchased_courses(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Course>>, AppError> {
    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(AppError::NotFound("user not found".into()));
    }

    let courses = Purchase::purchased_courses(&state.db, user_id).await?;
    Ok(Json(courses))
}
