//! HTTP routes.
//!
//! Everything lives under `/api`:
//!
//! - `/api/content` - create, view, download and delete shared content
//! - `/api/health` - liveness plus database reachability

pub mod content;
pub mod health;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use shared::api::MAX_CONTENT_LEN;

use crate::{config::Config, middleware::rate_limit::rate_limit, state::AppState};

/// Room for multipart boundaries and the small form fields.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Largest request body the server accepts.
pub fn body_limit(config: &Config) -> usize {
    config.max_upload_bytes + MAX_CONTENT_LEN + FORM_OVERHEAD_BYTES
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/content", content::router())
        .nest("/health", health::router())
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(DefaultBodyLimit::max(body_limit(&state.config)));

    Router::new().nest("/api", api).with_state(state)
}
