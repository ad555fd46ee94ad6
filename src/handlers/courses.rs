use crate::error::AppError;
use crate::extractors::ValidJson;
use crate::model::{Course, NewCourse};
use crate::response::created;
use crate::schema::{CourseCreate, CourseListQuery};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};

pub async fn create(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CourseCreate>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state
        .store
        .create_course(&NewCourse::from(body))
        .await
        .map_err(|e| e.into_app("Course already exists"))?;
    tracing::info!(id = course.id, code = %course.code, "course created");
    Ok(created(course))
}

/// Ordered by id; `limit` defaults to 10 and `offset` to 0.
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<CourseListQuery>, QueryRejection>,
) -> Result<Json<Vec<Course>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let courses = state.store.list_courses(query.limit(), query.offset()).await?;
    Ok(Json(courses))
}
