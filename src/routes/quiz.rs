use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{QuizError, Result};
use crate::models::quiz::{NewQuiz, QuestionAndAnswer, QuizPatch, Submission};
use crate::routes::extract::{JsonBody, PathParams};
use crate::services::quiz_service::{QUESTION_ADDED, QUIZ_CREATED};
use crate::AppState;

/// Malformed ids are reported as the matching not-found error.
pub(crate) fn parse_id(raw: &str, not_found: QuizError) -> std::result::Result<Uuid, QuizError> {
    Uuid::parse_str(raw).map_err(|_| not_found)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

#[axum::debug_handler]
pub async fn create_quiz(
    State(state): State<AppState>,
    PathParams(lesson_id): PathParams<String>,
    JsonBody(payload): JsonBody<NewQuiz>,
) -> Result<Response> {
    let lesson_id = parse_id(&lesson_id, QuizError::LessonNotFound)?;
    let quiz_id = state.quiz_service.create_new_quiz(lesson_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": QUIZ_CREATED, "quiz_id": quiz_id })),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn get_quiz_for_learner(
    State(state): State<AppState>,
    PathParams(quiz_id): PathParams<String>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let quiz = state.quiz_service.get_quiz_for_learner(quiz_id).await?;
    Ok(Json(quiz).into_response())
}

#[axum::debug_handler]
pub async fn get_quiz_for_instructor(
    State(state): State<AppState>,
    PathParams(quiz_id): PathParams<String>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let quiz = state.quiz_service.get_quiz_for_instructor(quiz_id).await?;
    Ok(Json(quiz).into_response())
}

#[axum::debug_handler]
pub async fn update_quiz(
    State(state): State<AppState>,
    PathParams(quiz_id): PathParams<String>,
    JsonBody(patch): JsonBody<QuizPatch>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let text = state.quiz_service.update_quiz(quiz_id, patch).await?;
    Ok(message(StatusCode::OK, text))
}

#[axum::debug_handler]
pub async fn remove_quiz(
    State(state): State<AppState>,
    PathParams((lesson_id, quiz_id)): PathParams<(String, String)>,
) -> Result<Response> {
    let lesson_id = parse_id(&lesson_id, QuizError::LessonNotFound)?;
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let text = state.quiz_service.remove_quiz(quiz_id, lesson_id).await?;
    Ok(message(StatusCode::OK, text))
}

#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    PathParams(quiz_id): PathParams<String>,
    JsonBody(payload): JsonBody<QuestionAndAnswer>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let question_id = state
        .quiz_service
        .add_question(quiz_id, payload.question, payload.answer)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": QUESTION_ADDED, "question_id": question_id })),
    )
        .into_response())
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    PathParams((quiz_id, question_id)): PathParams<(String, i32)>,
    JsonBody(payload): JsonBody<QuestionAndAnswer>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let text = state
        .quiz_service
        .update_question(quiz_id, question_id, payload.question, payload.answer)
        .await?;
    Ok(message(StatusCode::OK, text))
}

#[axum::debug_handler]
pub async fn remove_question(
    State(state): State<AppState>,
    PathParams((quiz_id, question_id)): PathParams<(String, i32)>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let text = state.quiz_service.remove_question(quiz_id, question_id).await?;
    Ok(message(StatusCode::OK, text))
}

#[axum::debug_handler]
pub async fn correct_quiz(
    State(state): State<AppState>,
    PathParams(quiz_id): PathParams<String>,
    JsonBody(submission): JsonBody<Submission>,
) -> Result<Response> {
    let quiz_id = parse_id(&quiz_id, QuizError::QuizNotFound)?;
    let score = state.quiz_service.correct_quiz(quiz_id, &submission).await?;
    tracing::debug!(%quiz_id, score = score.score, "quiz corrected");
    Ok(Json(score).into_response())
}
