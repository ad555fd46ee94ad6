//! Table DDL applied at startup. Idempotent: every statement is IF NOT EXISTS.

use crate::error::StoreError;
use sqlx::PgPool;

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        student_id TEXT NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        age INTEGER NOT NULL,
        CONSTRAINT users_student_id_key UNIQUE (student_id),
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        owner_id BIGINT NOT NULL,
        CONSTRAINT projects_owner_id_fkey FOREIGN KEY (owner_id)
            REFERENCES users (id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS projects_owner_id_idx ON projects (owner_id)",
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id BIGSERIAL PRIMARY KEY,
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        credits INTEGER NOT NULL,
        CONSTRAINT courses_code_key UNIQUE (code)
    )
    "#,
];

/// Create the users, projects and courses tables if they are missing.
pub async fn apply_schema(pool: &PgPool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;
    for stmt in DDL {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!("schema ready");
    Ok(())
}
