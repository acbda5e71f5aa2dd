use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{jwt::AuthUser, repo::User},
    catalog::repo::Course,
    enrollment::repo::Purchase,
    error::AppError,
    payments::{
        client::WebhookVerifier,
        dto::{
            CheckoutRequest, CheckoutResponse, CheckoutSessionRequest, SessionMetadata,
            WebhookAck, WebhookPayload, EVENT_CHECKOUT_COMPLETED,
        },
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments/checkout", post(create_checkout))
        .route("/payments/webhook", post(payment_webhook))
}

/// Opens a hosted checkout session for a paid course. Enrollment itself only
/// happens once the provider reports completion through the webhook.
#[instrument(skip(state, auth, payload))]
pub async fn create_checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let course = Course::find_by_id(&state.db, payload.course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("course not found".into()))?;

    if Purchase::exists(&state.db, auth.id, course.id).await? {
        return Err(AppError::AlreadyEnrolled);
    }

    if course.price_cents == 0 {
        return Err(AppError::Validation(
            "course is free, enroll directly".into(),
        ));
    }

    let session = state
        .payments
        .create_checkout_session(&CheckoutSessionRequest {
            amount_cents: course.price_cents,
            currency: "usd".into(),
            product_name: course.title.clone(),
            metadata: SessionMetadata {
                user_id: auth.id,
                course_id: course.id,
            },
        })
        .await?;

    info!(user_id = %auth.id, course_id = %course.id, session_id = %session.id, "checkout session opened");
    Ok(Json(CheckoutResponse {
        session_id: session.id,
        checkout_url: session.url,
    }))
}

/// Provider callback. Only a verified, signed `checkout.completed` event
/// unlocks the course; replays of the same event are harmless.
#[instrument(skip(state, payload))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<WebhookAck>, AppError> {
    let verifier = WebhookVerifier::from_ref(&state);
    let event = verifier.verify(&payload.event).map_err(|e| {
        warn!(error = %e, "webhook signature rejected");
        AppError::Unauthorized("invalid webhook signature".into())
    })?;

    if event.event != EVENT_CHECKOUT_COMPLETED {
        info!(event = %event.event, session_id = %event.sub, "webhook event ignored");
        return Ok(Json(WebhookAck { received: true }));
    }

    if User::find_by_id(&state.db, event.user_id).await?.is_none() {
        warn!(user_id = %event.user_id, session_id = %event.sub, "webhook for deleted user");
        return Ok(Json(WebhookAck { received: true }));
    }
    if Course::find_by_id(&state.db, event.course_id).await?.is_none() {
        warn!(course_id = %event.course_id, session_id = %event.sub, "webhook for deleted course");
        return Ok(Json(WebhookAck { received: true }));
    }

    if Purchase::insert(&state.db, event.user_id, event.course_id).await? {
        info!(user_id = %event.user_id, course_id = %event.course_id, session_id = %event.sub, "paid enrollment recorded");
    } else {
        info!(user_id = %event.user_id, course_id = %event.course_id, session_id = %event.sub, "duplicate webhook, already enrolled");
    }

    Ok(Json(WebhookAck { received: true }))
}
