//! PostgreSQL store. Every call borrows one pooled connection for a single statement.

use super::Store;
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::model::{
    Course, NewCourse, NewProject, NewUser, Project, ProjectChanges, ProjectWithOwner, User,
    UserChanges, UserWithProjects,
};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

const USER_COLUMNS: &str = "id, student_id, name, email, age";
const PROJECT_COLUMNS: &str = "id, name, description, owner_id";
const COURSE_COLUMNS: &str = "id, code, name, credits";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized from config.
    pub async fn connect(config: &AppConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct ProjectOwnerRow {
    id: i64,
    name: String,
    description: Option<String>,
    owner_id: i64,
    owner_student_id: String,
    owner_name: String,
    owner_email: String,
    owner_age: i32,
}

impl From<ProjectOwnerRow> for ProjectWithOwner {
    fn from(r: ProjectOwnerRow) -> Self {
        ProjectWithOwner {
            owner: User {
                id: r.owner_id,
                student_id: r.owner_student_id,
                name: r.owner_name,
                email: r.owner_email,
                age: r.owner_age,
            },
            project: Project {
                id: r.id,
                name: r.name,
                description: r.description,
                owner_id: r.owner_id,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserProjectsRow {
    #[sqlx(flatten)]
    user: User,
    projects: Json<Vec<Project>>,
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_with_projects(&self, id: i64) -> Result<Option<UserWithProjects>, StoreError> {
        let sql = format!(
            "SELECT {}, \
             (SELECT COALESCE(json_agg(sub ORDER BY sub.id), '[]'::json) \
              FROM (SELECT {} FROM projects p WHERE p.owner_id = u.id) sub) AS projects \
             FROM users u WHERE u.id = $1",
            USER_COLUMNS, PROJECT_COLUMNS
        );
        let row = sqlx::query_as::<_, UserProjectsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| UserWithProjects {
            user: r.user,
            projects: r.projects.0,
        }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        tracing::debug!(email = %user.email, "insert user");
        let sql = format!(
            "INSERT INTO users (student_id, name, email, age) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(&user.student_id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn replace_user(&self, id: i64, user: &NewUser) -> Result<Option<User>, StoreError> {
        tracing::debug!(id, "replace user");
        let sql = format!(
            "UPDATE users SET student_id = $2, name = $3, email = $4, age = $5 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&user.student_id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.age)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn patch_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>, StoreError> {
        tracing::debug!(id, "patch user");
        let sql = format!(
            "UPDATE users SET \
             student_id = COALESCE($2, student_id), \
             name = COALESCE($3, name), \
             email = COALESCE($4, email), \
             age = COALESCE($5, age) \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.student_id.as_deref())
            .bind(changes.name.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.age)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        tracing::debug!(id, "delete user");
        let done = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let sql = format!("SELECT {} FROM projects ORDER BY id", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql).fetch_all(&self.pool).await?)
    }

    async fn list_projects_for_owner(&self, owner_id: i64) -> Result<Vec<Project>, StoreError> {
        let sql = format!(
            "SELECT {} FROM projects WHERE owner_id = $1 ORDER BY id",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_project_with_owner(&self, id: i64) -> Result<Option<ProjectWithOwner>, StoreError> {
        let row = sqlx::query_as::<_, ProjectOwnerRow>(
            "SELECT p.id, p.name, p.description, p.owner_id, \
             u.student_id AS owner_student_id, u.name AS owner_name, \
             u.email AS owner_email, u.age AS owner_age \
             FROM projects p JOIN users u ON u.id = p.owner_id \
             WHERE p.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ProjectWithOwner::from))
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project, StoreError> {
        tracing::debug!(owner_id = project.owner_id, "insert project");
        let sql = format!(
            "INSERT INTO projects (name, description, owner_id) VALUES ($1, $2, $3) RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&project.name)
            .bind(project.description.as_deref())
            .bind(project.owner_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn replace_project(&self, id: i64, project: &NewProject) -> Result<Option<Project>, StoreError> {
        tracing::debug!(id, "replace project");
        let sql = format!(
            "UPDATE projects SET name = $2, description = $3, owner_id = $4 WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(&project.name)
            .bind(project.description.as_deref())
            .bind(project.owner_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn patch_project(&self, id: i64, changes: &ProjectChanges) -> Result<Option<Project>, StoreError> {
        tracing::debug!(id, "patch project");
        let sql = format!(
            "UPDATE projects SET \
             name = COALESCE($2, name), \
             description = CASE WHEN $3 THEN $4 ELSE description END \
             WHERE id = $1 RETURNING {}",
            PROJECT_COLUMNS
        );
        let description = changes.description.as_ref();
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(description.is_some())
            .bind(description.and_then(|d| d.as_deref()))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_course(&self, course: &NewCourse) -> Result<Course, StoreError> {
        tracing::debug!(code = %course.code, "insert course");
        let sql = format!(
            "INSERT INTO courses (code, name, credits) VALUES ($1, $2, $3) RETURNING {}",
            COURSE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(&course.code)
            .bind(&course.name)
            .bind(course.credits)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_courses(&self, limit: u32, offset: u32) -> Result<Vec<Course>, StoreError> {
        let sql = format!(
            "SELECT {} FROM courses ORDER BY id LIMIT $1 OFFSET $2",
            COURSE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Course>(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?)
    }
}

/// Ensure the database named in `database_url` exists, creating it if not. Connects to the
/// `postgres` maintenance database to run CREATE DATABASE. Call before building the pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let Some((admin_url, db_name)) = split_db_name(database_url) else {
        return Ok(());
    };
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let mut conn = PgConnectOptions::from_str(&admin_url)?.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split `postgres://host/db?opts` into (`postgres://host/postgres?opts`, `db`).
fn split_db_name(url: &str) -> Option<(String, String)> {
    let scheme_end = url.find("://")? + 3;
    let slash = scheme_end + url[scheme_end..].find('/')?;
    let rest = &url[slash + 1..];
    let (db_name, query) = match rest.split_once('?') {
        Some((db, q)) => (db, Some(q)),
        None => (rest, None),
    };
    let mut admin_url = format!("{}/postgres", &url[..slash]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Some((admin_url, db_name.trim().to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name_from_url() {
        assert_eq!(
            split_db_name("postgres://app:pw@db:5432/campus"),
            Some(("postgres://app:pw@db:5432/postgres".into(), "campus".into()))
        );
        assert_eq!(
            split_db_name("postgres://localhost/campus?sslmode=disable"),
            Some(("postgres://localhost/postgres?sslmode=disable".into(), "campus".into()))
        );
        assert_eq!(split_db_name("postgres://localhost"), None);
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("campus"), "\"campus\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
