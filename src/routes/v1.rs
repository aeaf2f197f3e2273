pub mod connections;
pub mod notifications;
pub mod users;
use crate::app_state::AppState;
use axum::Router;

pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::users_routes())
        .nest("/connections", connections::connections_routes())
        .nest("/notifications", notifications::notifications_routes())
}
