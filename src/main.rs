mod app_state;
mod db;
mod error;
mod handlers;
mod middlewares;
mod models;
mod queries;
mod routes;
mod service;

use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let pool = match db::connect_to_db().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    let session_store = PostgresStore::new(pool.clone());
    if let Err(e) = session_store.migrate().await {
        error!("Error preparing session store: {}", e);
        std::process::exit(1);
    }
    let session_layer = SessionManagerLayer::new(session_store).with_secure(false);

    let state = app_state::AppState { db_pool: pool };
    let app = routes::create_routes()
        .layer(session_layer)
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let address = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap();
    info!("Server running on {}", address);
    axum::serve(listener, app).await.unwrap();
}
