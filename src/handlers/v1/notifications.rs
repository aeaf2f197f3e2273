use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    middlewares::auth::current_user_id,
    queries::notifications::{list_notifications_for_user, mark_notification_read},
};

pub async fn get_notifications(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<impl IntoResponse> {
    let current_user = current_user_id(&session).await?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let notifications = list_notifications_for_user(&mut conn, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": notifications.len(),
            "notifications": notifications,
        })),
    ))
}

pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(notification_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let current_user = current_user_id(&session).await?;

    let notification_id = notification_id
        .parse::<Uuid>()
        .map_err(|_| AppError::BadRequest(anyhow!("Invalid notification ID format")))?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let notification = mark_notification_read(&mut conn, notification_id, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "notification": notification,
        })),
    ))
}
