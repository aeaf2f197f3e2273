use crate::app_state::AppState;
use crate::handlers::v1::users;
use axum::{routing::post, Router};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(users::signup)) // /api/v1/users/signup
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
}
