//! campus-api: CRUD REST backend for users, projects and courses.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, ConfigError, FieldError, StoreError};
pub use migration::apply_schema;
pub use routes::{app, common_routes, course_routes, project_routes, user_routes};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Store};
