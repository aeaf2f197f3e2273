use anyhow::anyhow;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::sessions::UserSession;

pub async fn auth_middleware(
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    // Check if the session has a user session
    match session.get::<UserSession>("user").await {
        Ok(Some(_user_session)) => {
            // User is authenticated, continue
            Ok(next.run(req).await)
        }
        Ok(None) => {
            // No user session found
            Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))
        }
        Err(e) => {
            // Session error
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Resolves the authenticated principal for handlers behind `auth_middleware`.
pub async fn current_user_id(session: &Session) -> AppResult<Uuid> {
    let user_session = session
        .get::<UserSession>("user")
        .await
        .map_err(|_| AppError::Unauthorized(anyhow!("Cannot find user session")))?;

    match user_session {
        Some(user_data) => Ok(user_data.user_id),
        None => Err(AppError::Unauthorized(anyhow!("User session not found"))),
    }
}
