pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

use crate::services::{lesson_service::LessonService, quiz_service::QuizService};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub quiz_service: QuizService,
    pub lesson_service: LessonService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let quiz_service = QuizService::new(pool.clone());
        let lesson_service = LessonService::new(pool.clone());

        Self {
            pool,
            quiz_service,
            lesson_service,
        }
    }
}
