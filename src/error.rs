use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Domain failures of the quiz and lesson workflows.
///
/// The `Display` text of each variant is the message surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    #[error("Quiz not found")]
    QuizNotFound,

    #[error("Question not found")]
    QuestionNotFound,

    #[error("Lesson not found")]
    LessonNotFound,

    #[error("Fields not in schema: {}", .0.join(", "))]
    UnknownFields(Vec<String>),

    #[error("Quiz must have at least one question")]
    NoQuestions,

    #[error("Quiz must have at least two options for each question")]
    TooFewOptions,

    #[error("Quiz must have answers for each question")]
    MissingAnswers,

    #[error("Answers must be same length as questions")]
    AnswerCountMismatch,

    #[error("Missing {0} field")]
    MissingField(&'static str),

    #[error("Invalid {0} field")]
    InvalidField(&'static str),

    #[error("You cannot update answers or questions fields")]
    ForbiddenField,
}

impl QuizError {
    pub fn status(&self) -> StatusCode {
        match self {
            QuizError::QuizNotFound | QuizError::QuestionNotFound | QuizError::LessonNotFound => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Quiz(err) => (err.status(), err.to_string()),
            Error::Database(err) => {
                tracing::error!(error = ?err, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
            Error::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            Error::Config(msg) => {
                tracing::error!(error = %msg, "configuration failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        if status.is_client_error() {
            tracing::debug!(status = %status, error = %error_message, "request rejected");
        }

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
