use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::error::{QuizError, Result};
use crate::models::lesson::CreateLessonPayload;
use crate::routes::extract::{JsonBody, PathParams};
use crate::routes::quiz::parse_id;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_lesson(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateLessonPayload>,
) -> Result<Response> {
    let lesson = state.lesson_service.create_lesson(payload).await?;
    tracing::info!(lesson_id = %lesson.id, "lesson created");
    Ok((StatusCode::CREATED, Json(lesson)).into_response())
}

#[axum::debug_handler]
pub async fn get_lesson(
    State(state): State<AppState>,
    PathParams(lesson_id): PathParams<String>,
) -> Result<Response> {
    let lesson_id = parse_id(&lesson_id, QuizError::LessonNotFound)?;
    let lesson = state.lesson_service.get_lesson(lesson_id).await?;
    Ok(Json(lesson).into_response())
}
