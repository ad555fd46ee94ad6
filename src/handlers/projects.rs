use crate::error::AppError;
use crate::extractors::{parse_id, ValidJson};
use crate::model::{NewProject, Project, ProjectChanges, ProjectWithOwner};
use crate::response::{created, ok};
use crate::schema::{ProjectCreate, ProjectUpdate};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

fn not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(state.store.list_projects().await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<Json<ProjectWithOwner>, AppError> {
    let id = parse_id(&id_str)?;
    let project = state
        .store
        .get_project_with_owner(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(project))
}

/// A missing owner surfaces as a foreign key violation, mapped to "User not found".
pub async fn create(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = state
        .store
        .create_project(&NewProject::from(body))
        .await
        .map_err(|e| e.into_app("Project creation failed"))?;
    tracing::info!(id = project.id, owner_id = project.owner_id, "project created");
    Ok(created(project))
}

pub async fn replace(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ValidJson(body): ValidJson<ProjectCreate>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let id = parse_id(&id_str)?;
    let project = state
        .store
        .replace_project(id, &NewProject::from(body))
        .await
        .map_err(|e| e.into_app("Project already exists"))?
        .ok_or_else(not_found)?;
    Ok(ok(project))
}

pub async fn patch(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ValidJson(body): ValidJson<ProjectUpdate>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let id = parse_id(&id_str)?;
    let project = state
        .store
        .patch_project(id, &ProjectChanges::from(body))
        .await
        .map_err(|e| e.into_app("Project already exists"))?
        .ok_or_else(not_found)?;
    Ok(ok(project))
}
