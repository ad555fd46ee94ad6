//! User handlers, plus the nested `/api/users/{id}/projects` routes.

use crate::error::AppError;
use crate::extractors::{parse_id, ValidJson};
use crate::model::{NewUser, Project, User, UserChanges};
use crate::response::{created, ok};
use crate::schema::{ProjectCreateForUser, UserCreate, UserQuery, UserUpdate};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

const NOT_FOUND: &str = "User not found";

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.into())
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let id = parse_id(&id_str)?;
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if query.with_projects()? {
        let user = state.store.get_user_with_projects(id).await?.ok_or_else(not_found)?;
        return Ok(ok(user).into_response());
    }
    let user = state.store.get_user(id).await?.ok_or_else(not_found)?;
    Ok(ok(user).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .store
        .create_user(&NewUser::from(body))
        .await
        .map_err(|e| e.into_app("User already exists"))?;
    tracing::info!(id = user.id, "user created");
    Ok(created(user))
}

/// PUT: every field is overwritten from the payload.
pub async fn replace(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ValidJson(body): ValidJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let id = parse_id(&id_str)?;
    let user = state
        .store
        .replace_user(id, &NewUser::from(body))
        .await
        .map_err(|e| e.into_app("Email or Student ID already exists"))?
        .ok_or_else(not_found)?;
    Ok(ok(user))
}

/// PATCH: only supplied fields change.
pub async fn patch(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ValidJson(body): ValidJson<UserUpdate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let id = parse_id(&id_str)?;
    let user = state
        .store
        .patch_user(id, &UserChanges::from(body))
        .await
        .map_err(|e| e.into_app("Email or Student ID already exists"))?
        .ok_or_else(not_found)?;
    Ok(ok(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id_str)?;
    if !state.store.delete_user(id).await? {
        return Err(not_found());
    }
    tracing::info!(id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_projects(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<Vec<Project>>, AppError> {
    let id = parse_id(&id_str)?;
    Ok(Json(state.store.list_projects_for_owner(id).await?))
}

pub async fn create_project(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ValidJson(body): ValidJson<ProjectCreateForUser>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let owner_id = parse_id(&id_str)?;
    if state.store.get_user(owner_id).await?.is_none() {
        return Err(not_found());
    }
    let project = state
        .store
        .create_project(&body.owned_by(owner_id))
        .await
        .map_err(|e| e.into_app("Project creation failed"))?;
    tracing::info!(id = project.id, owner_id, "project created");
    Ok(created(project))
}
