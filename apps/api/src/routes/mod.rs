pub mod auth;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::review::handlers;
use crate::review::validation::MAX_FILE_SIZE;
use crate::state::AppState;

/// Multipart framing and the text fields need room on top of the file itself.
const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE as usize + 1024 * 1024;

async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(handlers::handle_dashboard))
        .route(
            "/upload",
            get(handlers::handle_upload_form)
                .post(handlers::handle_upload)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/resume/:id", get(handlers::handle_results))
        .route("/resume/:id/file", get(handlers::handle_resume_file))
        .route("/resume/:id/image", get(handlers::handle_resume_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/auth", get(auth::handle_auth_page))
        .route("/auth/sign-up", post(auth::handle_sign_up))
        .route("/auth/sign-in", post(auth::handle_sign_in))
        .route("/auth/sign-out", post(auth::handle_sign_out))
        .merge(protected)
        .fallback(not_found)
        .with_state(state)
}
