use anyhow::anyhow;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::sessions::UserSession,
    queries::users::{find_auth_user_by_email, insert_user},
};

#[derive(Deserialize, Validate)]
pub struct Signup {
    #[validate(length(min = 1, max = 255, message = "Name is required and cannot be empty"))]
    name: String,

    #[validate(email(message = "Invalid email format"))]
    email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(mut payload): Json<Signup>,
) -> AppResult<impl IntoResponse> {
    payload.name = payload.name.trim().to_string();
    payload.email = payload.email.trim().to_lowercase();

    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid signup data: {}", e)))?;

    let password_hash = hash(payload.password.as_bytes(), DEFAULT_COST)
        .map_err(|_| AppError::InternalServerError(anyhow!("Error processing signup!")))?;

    let user_id = Uuid::new_v4();

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    insert_user(&mut conn, user_id, &payload.name, &payload.email, &password_hash).await?;

    session
        .insert("user", UserSession { user_id })
        .await
        .map_err(|e| AppError::InternalServerError(anyhow!("Failed to create session: {}", e)))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": {
                "id": user_id,
                "name": payload.name,
                "email": payload.email,
            },
        })),
    ))
}

#[derive(Deserialize, Validate)]
pub struct Login {
    #[validate(email(message = "Invalid email format"))]
    email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(mut payload): Json<Login>,
) -> AppResult<impl IntoResponse> {
    payload.email = payload.email.trim().to_lowercase();

    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid login data: {}", e)))?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let user = find_auth_user_by_email(&mut conn, &payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized(anyhow!("Invalid email or password")))?;

    let password_matches = verify(payload.password.as_bytes(), &user.password_hash)
        .map_err(|_| AppError::InternalServerError(anyhow!("Error processing login!")))?;

    if !password_matches {
        return Err(AppError::Unauthorized(anyhow!("Invalid email or password")));
    }

    // New session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::InternalServerError(anyhow!("Failed to refresh session: {}", e)))?;

    session
        .insert("user", UserSession { user_id: user.id })
        .await
        .map_err(|e| AppError::InternalServerError(anyhow!("Failed to create session: {}", e)))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
            },
        })),
    ))
}

pub async fn logout(session: Session) -> AppResult<impl IntoResponse> {
    session
        .flush()
        .await
        .map_err(|e| AppError::InternalServerError(anyhow!("Failed to end session: {}", e)))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Logged out",
        })),
    ))
}
