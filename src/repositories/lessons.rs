use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{QuizError, Result};
use crate::models::lesson::{CreateLessonPayload, Lesson};

pub async fn create_lesson(conn: &mut PgConnection, payload: CreateLessonPayload) -> Result<Lesson> {
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
        INSERT INTO lessons (id, title, content)
        VALUES ($1, $2, $3)
        RETURNING id, title, content, quiz_id, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.title)
    .bind(payload.content)
    .fetch_one(conn)
    .await?;

    Ok(lesson)
}

pub async fn get_lesson(conn: &mut PgConnection, lesson_id: Uuid) -> Result<Lesson> {
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"SELECT id, title, content, quiz_id, created_at, updated_at FROM lessons WHERE id = $1"#,
    )
    .bind(lesson_id)
    .fetch_optional(conn)
    .await?
    .ok_or(QuizError::LessonNotFound)?;

    Ok(lesson)
}

pub async fn add_quiz_to_lesson(
    conn: &mut PgConnection,
    lesson_id: Uuid,
    quiz_id: Uuid,
) -> Result<()> {
    let result = sqlx::query(
        r#"UPDATE lessons SET quiz_id = $2, updated_at = NOW() WHERE id = $1"#,
    )
    .bind(lesson_id)
    .bind(quiz_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(QuizError::LessonNotFound.into());
    }
    Ok(())
}

pub async fn remove_quiz_from_lesson(conn: &mut PgConnection, lesson_id: Uuid) -> Result<()> {
    let result = sqlx::query(
        r#"UPDATE lessons SET quiz_id = NULL, updated_at = NOW() WHERE id = $1"#,
    )
    .bind(lesson_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(QuizError::LessonNotFound.into());
    }
    Ok(())
}
