use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A lesson owns the link to its quiz; quizzes never point back.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub quiz_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLessonPayload {
    #[validate(length(min = 1, message = "Lesson title must not be empty"))]
    pub title: String,
    pub content: Option<String>,
}
