//! Persisted entities and the write payloads the store accepts.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credits: i32,
}

/// Project read with its owner joined in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithOwner {
    #[serde(flatten)]
    pub project: Project,
    pub owner: User,
}

/// User read with every project it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithProjects {
    #[serde(flatten)]
    pub user: User,
    pub projects: Vec<Project>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCourse {
    pub code: String,
    pub name: String,
    pub credits: i32,
}

/// Fields to overwrite on a user; `None` leaves the column untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub student_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
}

impl UserChanges {
    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.student_id {
            user.student_id = v.clone();
        }
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = self.age {
            user.age = v;
        }
    }
}

/// Fields to overwrite on a project. `description: Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl ProjectChanges {
    pub fn apply(&self, project: &mut Project) {
        if let Some(v) = &self.name {
            project.name = v.clone();
        }
        if let Some(v) = &self.description {
            project.description = v.clone();
        }
    }
}
