use crate::handlers::v1::connections;
use crate::{app_state::AppState, middlewares::auth::auth_middleware};
use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};

pub fn connections_routes() -> Router<AppState> {
    // Protected routes that require authentication
    Router::new()
        .route("/send/{user_id}", post(connections::send_connection_request))
        .route(
            "/accept/{connection_id}",
            put(connections::accept_connection_request),
        )
        .route(
            "/decline/{connection_id}",
            put(connections::decline_connection_request),
        )
        .route("/requests", get(connections::get_connection_requests))
        .route(
            "/suggestions",
            get(connections::get_connection_suggestions),
        )
        .route("/status/{user_id}", get(connections::get_connection_status))
        .route("/", get(connections::get_connections))
        .route("/{user_id}", delete(connections::remove_connection))
        .layer(middleware::from_fn(auth_middleware))
}
