//! HTTP handlers for users, projects and courses.

pub mod courses;
pub mod projects;
pub mod users;
