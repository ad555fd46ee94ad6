//! Persistence seam. Handlers only see [`Store`]; `PgStore` backs the server and
//! `MemoryStore` keeps the same constraint semantics in process.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::error::StoreError;
use crate::model::{
    Course, NewCourse, NewProject, NewUser, Project, ProjectChanges, ProjectWithOwner, User,
    UserChanges, UserWithProjects,
};
use async_trait::async_trait;

/// Constraint names, shared so both stores report the same violation.
pub mod constraints {
    pub const USERS_EMAIL: &str = "users_email_key";
    pub const USERS_STUDENT_ID: &str = "users_student_id_key";
    pub const COURSES_CODE: &str = "courses_code_key";
    pub const PROJECTS_OWNER: &str = "projects_owner_id_fkey";
}

/// CRUD over users, projects and courses. Lists are ordered by id ascending.
/// Methods keyed by id return `None` (or `false`) when the row does not exist.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn get_user_with_projects(&self, id: i64) -> Result<Option<UserWithProjects>, StoreError>;
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;
    async fn replace_user(&self, id: i64, user: &NewUser) -> Result<Option<User>, StoreError>;
    async fn patch_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>, StoreError>;
    /// Deletes the user and, by cascade, every project it owns.
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    /// No existence check on the owner: an unknown id yields an empty list.
    async fn list_projects_for_owner(&self, owner_id: i64) -> Result<Vec<Project>, StoreError>;
    async fn get_project_with_owner(&self, id: i64) -> Result<Option<ProjectWithOwner>, StoreError>;
    /// Fails with `ForeignKeyViolation` when the owner does not exist.
    async fn create_project(&self, project: &NewProject) -> Result<Project, StoreError>;
    async fn replace_project(&self, id: i64, project: &NewProject) -> Result<Option<Project>, StoreError>;
    async fn patch_project(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>, StoreError>;

    async fn create_course(&self, course: &NewCourse) -> Result<Course, StoreError>;
    async fn list_courses(&self, limit: u32, offset: u32) -> Result<Vec<Course>, StoreError>;
}
