//! Route table for the listing API

use super::AppState;
use super::handlers::{
    create_plot, create_rental, delete_plot, delete_rental, directory_events, featured, get_plot,
    get_rental, health_check, list_plots, list_rentals, login, logout, session, signup,
};
use axum::{
    Router,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the full router
///
/// - GET /plots, /rentals - Filtered and sorted listings (`sort` plus criteria)
/// - GET /plots/{id}, /rentals/{id} - One listing and similar ones
/// - GET /featured - Home page selection
/// - POST /admin/plots, /admin/rentals - Create (admin bearer token required)
/// - DELETE /admin/plots/{id}, /admin/rentals/{id} - Delete (admin bearer token required)
/// - POST /auth/login, /auth/signup - Issue a session and its access token
/// - POST /auth/logout, GET /auth/session - Act on the caller's own session
/// - GET /events - Directory revisions as server-sent events
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .merge(listing_routes())
        .merge(admin_routes())
        .merge(auth_routes())
        .route("/events", get(directory_events))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/plots", get(list_plots))
        .route("/plots/{id}", get(get_plot))
        .route("/rentals", get(list_rentals))
        .route("/rentals/{id}", get(get_rental))
        .route("/featured", get(featured))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/plots", post(create_plot))
        .route("/admin/plots/{id}", delete(delete_plot))
        .route("/admin/rentals", post(create_rental))
        .route("/admin/rentals/{id}", delete(delete_rental))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
}
