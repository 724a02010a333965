use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::traits::ContentStore;

pub fn create_router<S: ContentStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Draft sessions
        .route("/sessions", post(handlers::begin_session::<S>))
        .route("/sessions/:session_id", get(handlers::get_session::<S>))
        .route(
            "/sessions/:session_id/assets",
            post(handlers::upload_asset::<S>),
        )
        .route("/sessions/:session_id/form", put(handlers::update_form::<S>))
        .route(
            "/sessions/:session_id/changes",
            get(handlers::get_changes::<S>),
        )
        .route(
            "/sessions/:session_id/commit",
            post(handlers::commit_session::<S>),
        )
        .route(
            "/sessions/:session_id/abandon",
            post(handlers::abandon_session::<S>),
        )
        // Unsaved-changes navigation guard
        .route(
            "/sessions/:session_id/navigate",
            post(handlers::request_navigate::<S>),
        )
        .route(
            "/sessions/:session_id/navigate/resolve",
            post(handlers::resolve_navigation::<S>),
        )
        // Committed records
        .route("/records/:category/:id", get(handlers::get_record::<S>))
}
