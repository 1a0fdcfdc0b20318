//! Axum application setup.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration for local development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Table
        .route("/table", get(handlers::get_table))
        .route("/history", get(handlers::get_history))
        .route("/crop", post(handlers::crop_table))
        .route("/evaluate", post(handlers::evaluate_expression))
        // Derived columns and flags
        .route("/columns", post(handlers::add_column))
        .route("/columns/:name", delete(handlers::remove_column))
        .route("/flags", post(handlers::add_flag))
        .route("/flags/remove", post(handlers::remove_flag))
        // Suggestions
        .route("/suggestions", post(handlers::request_suggestions))
        .route(
            "/suggestions/columns/:index/apply",
            post(handlers::apply_suggested_column),
        )
        .route(
            "/suggestions/flags/:index/apply",
            post(handlers::apply_suggested_flag),
        )
        // Export
        .route("/export", get(handlers::export_csv));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
