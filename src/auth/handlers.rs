use anyhow::Context;
use axum::{
    extract::{FromRef, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AuthResponse, DeletedResponse, ForgotPasswordRequest, LoginRequest, MessageResponse,
            PublicUser, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest,
            VerifyOtpResponse,
        },
        jwt::{AdminUser, JwtKeys},
        repo::{OtpCode, ResetTicket, User, ORIGIN_ADMIN, ORIGIN_USER},
        services::{
            dummy_verify, generate_otp, generate_reset_ticket, hash_password, hash_reset_ticket,
            is_valid_email, verify_password,
        },
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-otp", post(verify_otp))
        .route("/reset-password", post(reset_password))
}

pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(provision_user))
        .route("/admin/users/:id", delete(delete_user))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    if password.len() < 8 {
        return Err(AppError::Validation("password too short".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, AppError> {
    payload.email = normalize_email(&payload.email);
    validate_credentials(&payload.email, &payload.password)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    // Ensure email is not taken
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.name.trim(),
        ORIGIN_USER,
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = normalize_email(&payload.email);
    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            // Burn a verification so this path costs the same as a wrong
            // password; the response never says which one it was.
            dummy_verify(&payload.password);
            warn!(email = %payload.email, "login unknown email");
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role())?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.email = normalize_email(&payload.email);

    if User::find_by_email(&state.db, &payload.email).await?.is_none() {
        return Err(AppError::NotFound("user not found".into()));
    }

    let code = generate_otp();
    // Persist before dispatch: a failed send must not invalidate the code.
    OtpCode::upsert(&state.db, &payload.email, &code).await?;

    state
        .mailer
        .send(
            &payload.email,
            "Password Reset OTP",
            &format!("Your OTP is {code}. It expires in 5 minutes."),
        )
        .await
        .context("dispatch otp email")?;

    info!(email = %payload.email, "otp issued");
    Ok(Json(MessageResponse {
        message: "OTP sent to email".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(mut payload): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    payload.email = normalize_email(&payload.email);
    if payload.otp.trim().is_empty() {
        return Err(AppError::Validation("otp is required".into()));
    }

    // Single atomic delete covers match, expiry and single-use at once.
    if !OtpCode::consume(&state.db, &payload.email, payload.otp.trim()).await? {
        if OtpCode::live_exists(&state.db, &payload.email).await? {
            warn!(email = %payload.email, "otp mismatch");
            return Err(AppError::Unauthorized("invalid code".into()));
        }
        return Err(AppError::Validation("OTP expired or never requested".into()));
    }

    let ticket = generate_reset_ticket();
    ResetTicket::upsert(&state.db, &payload.email, &hash_reset_ticket(&ticket)).await?;

    info!(email = %payload.email, "otp verified, reset ticket issued");
    Ok(Json(VerifyOtpResponse {
        reset_token: ticket,
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.email = normalize_email(&payload.email);
    if payload.new_password.len() < 8 {
        return Err(AppError::Validation("password too short".into()));
    }
    if payload.reset_token.trim().is_empty() {
        return Err(AppError::Validation("reset_token is required".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_none() {
        return Err(AppError::NotFound("user not found".into()));
    }

    // Reset is only reachable through a previously verified OTP.
    let consumed = ResetTicket::consume(
        &state.db,
        &payload.email,
        &hash_reset_ticket(payload.reset_token.trim()),
    )
    .await?;
    if !consumed {
        warn!(email = %payload.email, "reset ticket invalid or expired");
        return Err(AppError::Unauthorized("invalid or expired reset ticket".into()));
    }

    let hash = hash_password(&payload.new_password)?;
    if !User::update_password(&state.db, &payload.email, &hash).await? {
        return Err(AppError::NotFound("user not found".into()));
    }

    info!(email = %payload.email, "password reset");
    Ok(Json(MessageResponse {
        message: "password reset successful".into(),
    }))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn provision_user(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, AppError> {
    payload.email = normalize_email(&payload.email);
    validate_credentials(&payload.email, &payload.password)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        return Err(AppError::Conflict("email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.email,
        &hash,
        payload.name.trim(),
        ORIGIN_ADMIN,
    )
    .await?;

    info!(user_id = %user.id, provisioned_by = %admin_id, "admin account provisioned");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = User::delete(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

    info!(user_id = %deleted, deleted_by = %admin_id, "user deleted");
    Ok(Json(DeletedResponse { id: deleted }))
}
