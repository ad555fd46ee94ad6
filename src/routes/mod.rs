//! Router assembly.

mod api;
mod common;

pub use api::{course_routes, project_routes, user_routes};
pub use common::common_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
pub const BODY_LIMIT: usize = 1024 * 1024;

/// Full application: common routes at the root, entity routes under `/api`.
/// CORS is wide open (any origin, method and header).
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(user_routes(state.clone()))
        .merge(project_routes(state.clone()))
        .merge(course_routes(state.clone()));

    Router::new()
        .merge(common_routes(state))
        .nest("/api", api)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
