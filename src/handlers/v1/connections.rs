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
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    middlewares::auth::current_user_id,
    service::connections,
};

fn parse_user_id(raw: &str) -> AppResult<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::BadRequest(anyhow!("Invalid user ID format")))
}

fn parse_connection_id(raw: &str) -> AppResult<Uuid> {
    raw.parse::<Uuid>()
        .map_err(|_| AppError::BadRequest(anyhow!("Invalid connection ID format")))
}

#[derive(serde::Deserialize, Validate)]
pub struct SendConnectionData {
    #[validate(length(max = 300, message = "Message cannot exceed 300 characters"))]
    pub message: Option<String>,
}

pub async fn send_connection_request(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<String>,
    Json(mut payload): Json<SendConnectionData>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(anyhow!("Invalid connection request data: {}", e)))?;

    if let Some(message) = &mut payload.message {
        *message = message.trim().to_string();
        if message.is_empty() {
            payload.message = None;
        }
    }

    let current_user = current_user_id(&session).await?;
    let target_id = parse_user_id(&user_id)?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let connection =
        connections::send_request(&mut *conn, current_user, target_id, payload.message).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Connection request sent successfully",
            "connection": connection,
        })),
    ))
}

pub async fn accept_connection_request(
    State(state): State<AppState>,
    session: Session,
    Path(connection_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let current_user = current_user_id(&session).await?;
    let connection_id = parse_connection_id(&connection_id)?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let connection = connections::accept_request(&mut *conn, connection_id, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Connection request accepted",
            "connection": connection,
        })),
    ))
}

pub async fn decline_connection_request(
    State(state): State<AppState>,
    session: Session,
    Path(connection_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let current_user = current_user_id(&session).await?;
    let connection_id = parse_connection_id(&connection_id)?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let connection = connections::decline_request(&mut *conn, connection_id, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Connection request declined",
            "connection": connection,
        })),
    ))
}

pub async fn get_connection_requests(
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

    let requests = connections::pending_incoming(&mut *conn, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": requests.len(),
            "requests": requests,
        })),
    ))
}

pub async fn get_connections(
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

    let members = connections::connections_of(&mut *conn, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": members.len(),
            "connections": members,
        })),
    ))
}

pub async fn remove_connection(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let current_user = current_user_id(&session).await?;
    let other_id = parse_user_id(&user_id)?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    connections::remove_connection(&mut *conn, current_user, other_id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Connection removed successfully",
        })),
    ))
}

pub async fn get_connection_suggestions(
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

    let suggestions = connections::suggestions(&mut *conn, current_user).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "count": suggestions.len(),
            "suggestions": suggestions,
        })),
    ))
}

pub async fn get_connection_status(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let current_user = current_user_id(&session).await?;
    let other_id = parse_user_id(&user_id)?;

    let mut conn = state.db_pool.acquire().await.map_err(|e| {
        AppError::InternalServerError(anyhow!(
            "Failed to acquire database connection: {}",
            e
        ))
    })?;

    let view = connections::relationship_status(&mut *conn, current_user, other_id).await?;

    let mut body = serde_json::to_value(&view)
        .map_err(|e| AppError::InternalServerError(anyhow!("Failed to serialize status: {}", e)))?;
    body["success"] = serde_json::Value::Bool(true);

    Ok((StatusCode::OK, Json(body)))
}
