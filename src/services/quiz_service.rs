use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::quiz::{LearnerQuiz, NewQuiz, Question, Quiz, QuizPatch, QuizScore, Submission};
use crate::repositories::{lessons, quizzes};

pub const QUIZ_CREATED: &str = "Quiz created and added to the lesson successfully";
pub const QUIZ_UPDATED: &str = "Quiz updated successfully";
pub const QUIZ_REMOVED: &str = "Quiz removed successfully";
pub const QUESTION_ADDED: &str = "Question added successfully";
pub const QUESTION_UPDATED: &str = "Question updated successfully";
pub const QUESTION_REMOVED: &str = "Question removed successfully";

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

/// Commits on success. On failure rolls back and hands back the error that
/// caused it, untouched.
async fn settle<T>(tx: Transaction<'_, Postgres>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = ?rollback_err, "failed to roll back quiz transaction");
            }
            Err(err)
        }
    }
}

async fn create_and_link(conn: &mut PgConnection, lesson_id: Uuid, quiz: NewQuiz) -> Result<Uuid> {
    let quiz_id = quizzes::create_quiz(&mut *conn, quiz).await?;
    lessons::add_quiz_to_lesson(conn, lesson_id, quiz_id).await?;
    Ok(quiz_id)
}

async fn apply_update(conn: &mut PgConnection, quiz_id: Uuid, mut patch: QuizPatch) -> Result<()> {
    if let Some((questions, answers)) = patch.take_content()? {
        quizzes::update_questions_and_answers(&mut *conn, quiz_id, questions, answers).await?;
    }
    quizzes::update_quiz_metadata(conn, quiz_id, &patch).await
}

async fn delete_and_unlink(conn: &mut PgConnection, quiz_id: Uuid, lesson_id: Uuid) -> Result<()> {
    quizzes::delete_quiz(&mut *conn, quiz_id).await?;
    lessons::remove_quiz_from_lesson(conn, lesson_id).await
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a quiz and links it into its lesson. Either both happen or
    /// neither does.
    pub async fn create_new_quiz(&self, lesson_id: Uuid, quiz: NewQuiz) -> Result<Uuid> {
        let mut tx = self.pool.begin().await?;
        let outcome = create_and_link(&mut tx, lesson_id, quiz).await;
        let quiz_id = settle(tx, outcome).await?;
        tracing::info!(%quiz_id, %lesson_id, "quiz created");
        Ok(quiz_id)
    }

    /// Replaces content (when both `questions` and `answers` are given) and
    /// applies the remaining metadata in one transaction.
    pub async fn update_quiz(&self, quiz_id: Uuid, patch: QuizPatch) -> Result<&'static str> {
        let mut tx = self.pool.begin().await?;
        let outcome = apply_update(&mut tx, quiz_id, patch).await;
        settle(tx, outcome).await?;
        Ok(QUIZ_UPDATED)
    }

    pub async fn remove_quiz(&self, quiz_id: Uuid, lesson_id: Uuid) -> Result<&'static str> {
        let mut tx = self.pool.begin().await?;
        let outcome = delete_and_unlink(&mut tx, quiz_id, lesson_id).await;
        settle(tx, outcome).await?;
        tracing::info!(%quiz_id, %lesson_id, "quiz removed");
        Ok(QUIZ_REMOVED)
    }

    pub async fn add_question(&self, quiz_id: Uuid, question: Question, answer: String) -> Result<i32> {
        let mut tx = self.pool.begin().await?;
        let outcome = quizzes::add_question_and_answer(&mut tx, quiz_id, question, answer).await;
        settle(tx, outcome).await
    }

    pub async fn update_question(
        &self,
        quiz_id: Uuid,
        question_id: i32,
        question: Question,
        answer: String,
    ) -> Result<&'static str> {
        let mut tx = self.pool.begin().await?;
        let outcome =
            quizzes::update_question_and_answer(&mut tx, quiz_id, question_id, question, answer)
                .await;
        settle(tx, outcome).await?;
        Ok(QUESTION_UPDATED)
    }

    pub async fn remove_question(&self, quiz_id: Uuid, question_id: i32) -> Result<&'static str> {
        let mut tx = self.pool.begin().await?;
        let outcome = quizzes::remove_question_and_answer(&mut tx, quiz_id, question_id).await;
        settle(tx, outcome).await?;
        Ok(QUESTION_REMOVED)
    }

    pub async fn get_quiz_for_learner(&self, quiz_id: Uuid) -> Result<LearnerQuiz> {
        let mut conn = self.pool.acquire().await?;
        quizzes::get_quiz(&mut conn, quiz_id).await
    }

    pub async fn get_quiz_for_instructor(&self, quiz_id: Uuid) -> Result<Quiz> {
        let mut conn = self.pool.acquire().await?;
        quizzes::get_quiz_for_creator(&mut conn, quiz_id).await
    }

    pub async fn correct_quiz(&self, quiz_id: Uuid, submission: &Submission) -> Result<QuizScore> {
        let mut conn = self.pool.acquire().await?;
        quizzes::correct_answers(&mut conn, quiz_id, submission).await
    }
}
