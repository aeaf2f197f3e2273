use crate::handlers::v1::notifications;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::{get, put};
use axum::{middleware, Router};

pub fn notifications_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::get_notifications))
        .route("/{notification_id}/read", put(notifications::mark_read))
        .layer(middleware::from_fn(auth_middleware))
}
