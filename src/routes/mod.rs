pub mod extract;
pub mod health;
pub mod lesson;
pub mod quiz;

use axum::{
    middleware::from_fn,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::{require_bearer_auth, require_instructor};
use crate::AppState;

pub fn app(state: AppState) -> Router {
    let authoring_api = Router::new()
        .route("/api/lessons", post(lesson::create_lesson))
        .route("/api/lessons/:lesson_id/quizzes", post(quiz::create_quiz))
        .route(
            "/api/lessons/:lesson_id/quizzes/:quiz_id",
            delete(quiz::remove_quiz),
        )
        .route("/api/quizzes/:quiz_id", patch(quiz::update_quiz))
        .route(
            "/api/quizzes/:quiz_id/full",
            get(quiz::get_quiz_for_instructor),
        )
        .route("/api/quizzes/:quiz_id/questions", post(quiz::add_question))
        .route(
            "/api/quizzes/:quiz_id/questions/:question_id",
            put(quiz::update_question).delete(quiz::remove_question),
        )
        .layer(from_fn(require_instructor));

    let learner_api = Router::new()
        .route("/api/lessons/:lesson_id", get(lesson::get_lesson))
        .route("/api/quizzes/:quiz_id", get(quiz::get_quiz_for_learner))
        .route("/api/quizzes/:quiz_id/correct", post(quiz::correct_quiz))
        .layer(from_fn(require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .merge(authoring_api)
        .merge(learner_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
