//! Entity routes. Update and delete live under verb-named segments
//! (`/update/:id`, `/patch/:id`, `/delete/:id`).

use crate::handlers::{courses, projects, users};
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, put},
    Router,
};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::read))
        .route(
            "/users/:id/projects",
            get(users::list_projects).post(users::create_project),
        )
        .route("/users/update/:id", put(users::replace))
        .route("/users/patch/:id", patch(users::patch))
        .route("/users/delete/:id", delete(users::delete))
        .with_state(state)
}

pub fn project_routes(state: AppState) -> Router {
    Router::new()
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/:id", get(projects::read))
        .route("/projects/update/:id", put(projects::replace))
        .route("/projects/patch/:id", patch(projects::patch))
        .with_state(state)
}

pub fn course_routes(state: AppState) -> Router {
    Router::new()
        .route("/courses", get(courses::list).post(courses::create))
        .with_state(state)
}
