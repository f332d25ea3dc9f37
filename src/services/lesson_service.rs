use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::models::lesson::{CreateLessonPayload, Lesson};
use crate::repositories::lessons;

#[derive(Clone)]
pub struct LessonService {
    pool: PgPool,
}

impl LessonService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_lesson(&self, payload: CreateLessonPayload) -> Result<Lesson> {
        payload.validate()?;
        let mut conn = self.pool.acquire().await?;
        lessons::create_lesson(&mut conn, payload).await
    }

    pub async fn get_lesson(&self, lesson_id: Uuid) -> Result<Lesson> {
        let mut conn = self.pool.acquire().await?;
        lessons::get_lesson(&mut conn, lesson_id).await
    }
}
