//! Data access for quizzes.
//!
//! Every function takes a `&mut PgConnection`. Pass a pooled connection to run
//! a single statement on its own, or `&mut *tx` to take part in a
//! transaction opened by the caller.

use sqlx::types::Json;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{Error, QuizError, Result};
use crate::models::quiz::{
    renumber, validate_content, validate_question, LearnerQuiz, NewQuiz, Question, Quiz,
    QuizPatch, QuizRow, QuizScore, Submission,
};

const SELECT_QUIZ: &str = r#"
    SELECT id, title, questions, answers, questions_per_quiz, time_to_finish, created_at, updated_at
    FROM quizzes
    WHERE id = $1
"#;

const SELECT_QUIZ_FOR_UPDATE: &str = r#"
    SELECT id, title, questions, answers, questions_per_quiz, time_to_finish, created_at, updated_at
    FROM quizzes
    WHERE id = $1
    FOR UPDATE
"#;

fn map_write_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        let mapped = match db_err.constraint() {
            Some("quizzes_questions_check") => Some(QuizError::NoQuestions),
            Some("quizzes_title_check") => Some(QuizError::MissingField("title")),
            Some("quizzes_questions_per_quiz_check") => {
                Some(QuizError::InvalidField("questions_per_quiz"))
            }
            Some("quizzes_time_to_finish_check") => Some(QuizError::InvalidField("time_to_finish")),
            _ => None,
        };
        if let Some(quiz_err) = mapped {
            return quiz_err.into();
        }
    }
    err.into()
}

async fn find_quiz(conn: &mut PgConnection, quiz_id: Uuid, sql: &str) -> Result<Quiz> {
    let row = sqlx::query_as::<_, QuizRow>(sql)
        .bind(quiz_id)
        .fetch_optional(conn)
        .await?
        .ok_or(QuizError::QuizNotFound)?;
    Ok(row.into())
}

async fn write_content(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    questions: Vec<Question>,
    answers: Vec<String>,
) -> Result<()> {
    let result = sqlx::query(
        r#"UPDATE quizzes SET questions = $2, answers = $3, updated_at = NOW() WHERE id = $1"#,
    )
    .bind(quiz_id)
    .bind(Json(questions))
    .bind(Json(answers))
    .execute(conn)
    .await
    .map_err(map_write_error)?;

    if result.rows_affected() == 0 {
        return Err(QuizError::QuizNotFound.into());
    }
    Ok(())
}

/// Inserts a new quiz and returns its id. Question ids are reassigned from
/// their positions.
pub async fn create_quiz(conn: &mut PgConnection, quiz: NewQuiz) -> Result<Uuid> {
    quiz.validate()?;

    let quiz_id = Uuid::new_v4();
    let questions = renumber(quiz.questions);
    let time_to_finish = quiz
        .time_to_finish
        .ok_or(QuizError::MissingField("time_to_finish"))?;

    sqlx::query(
        r#"
        INSERT INTO quizzes (id, title, questions, answers, questions_per_quiz, time_to_finish)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(quiz_id)
    .bind(quiz.title)
    .bind(Json(questions))
    .bind(Json(quiz.answers))
    .bind(quiz.questions_per_quiz)
    .bind(time_to_finish)
    .execute(conn)
    .await
    .map_err(map_write_error)?;

    Ok(quiz_id)
}

/// Learner-facing fetch: a freshly shuffled subset, without answers.
pub async fn get_quiz(conn: &mut PgConnection, quiz_id: Uuid) -> Result<LearnerQuiz> {
    let quiz = find_quiz(conn, quiz_id, SELECT_QUIZ).await?;
    Ok(quiz.into_learner_view(&mut rand::thread_rng()))
}

pub async fn get_quiz_for_creator(conn: &mut PgConnection, quiz_id: Uuid) -> Result<Quiz> {
    find_quiz(conn, quiz_id, SELECT_QUIZ).await
}

pub async fn update_quiz_metadata(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    patch: &QuizPatch,
) -> Result<()> {
    patch.validate_metadata()?;

    let result = sqlx::query(
        r#"
        UPDATE quizzes
        SET
            title = COALESCE($2, title),
            questions_per_quiz = COALESCE($3, questions_per_quiz),
            time_to_finish = COALESCE($4, time_to_finish),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .bind(patch.title.as_deref())
    .bind(patch.questions_per_quiz)
    .bind(patch.time_to_finish)
    .execute(conn)
    .await
    .map_err(map_write_error)?;

    if result.rows_affected() == 0 {
        return Err(QuizError::QuizNotFound.into());
    }
    Ok(())
}

pub async fn update_question_and_answer(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    question_id: i32,
    question: Question,
    answer: String,
) -> Result<()> {
    let mut quiz = find_quiz(&mut *conn, quiz_id, SELECT_QUIZ_FOR_UPDATE).await?;
    quiz.replace_question(question_id, question, answer)?;
    write_content(conn, quiz_id, quiz.questions, quiz.answers).await
}

/// Appends a question and its answer in one statement. The new question's
/// id is the question count before the append.
pub async fn add_question_and_answer(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    question: Question,
    answer: String,
) -> Result<i32> {
    validate_question(&question)?;

    let row: Option<(i32,)> = sqlx::query_as(
        r#"
        UPDATE quizzes
        SET
            questions = questions || jsonb_build_array(
                jsonb_set($2::jsonb, '{id}', to_jsonb(jsonb_array_length(questions)))
            ),
            answers = answers || jsonb_build_array($3::text),
            updated_at = NOW()
        WHERE id = $1
        RETURNING jsonb_array_length(questions) - 1
        "#,
    )
    .bind(quiz_id)
    .bind(Json(question))
    .bind(answer)
    .fetch_optional(conn)
    .await
    .map_err(map_write_error)?;

    let (question_id,) = row.ok_or(QuizError::QuizNotFound)?;
    Ok(question_id)
}

pub async fn remove_question_and_answer(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    question_id: i32,
) -> Result<()> {
    let mut quiz = find_quiz(&mut *conn, quiz_id, SELECT_QUIZ_FOR_UPDATE).await?;
    quiz.remove_question(question_id)?;
    write_content(conn, quiz_id, quiz.questions, quiz.answers).await
}

/// Replaces the whole question list and answer list of a quiz.
pub async fn update_questions_and_answers(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    questions: Vec<Question>,
    answers: Vec<String>,
) -> Result<()> {
    validate_content(&questions, &answers)?;
    write_content(conn, quiz_id, renumber(questions), answers).await
}

pub async fn correct_answers(
    conn: &mut PgConnection,
    quiz_id: Uuid,
    submission: &Submission,
) -> Result<QuizScore> {
    let quiz = find_quiz(conn, quiz_id, SELECT_QUIZ).await?;
    Ok(quiz.correct(submission)?)
}

pub async fn delete_quiz(conn: &mut PgConnection, quiz_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(QuizError::QuizNotFound.into());
    }
    Ok(())
}
