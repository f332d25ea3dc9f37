mod common;

use std::collections::HashSet;

use academy_backend::error::{Error, QuizError};
use academy_backend::models::lesson::CreateLessonPayload;
use academy_backend::models::quiz::{NewQuiz, Question, QuizPatch, Submission};
use academy_backend::repositories::quizzes;
use academy_backend::services::lesson_service::LessonService;
use academy_backend::services::quiz_service::{QuizService, QUIZ_REMOVED, QUIZ_UPDATED};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn unique_title(prefix: &str) -> String {
    format!("{} {}", prefix, Uuid::new_v4())
}

fn new_quiz(title: &str) -> NewQuiz {
    serde_json::from_value(common::math_quiz(title)).expect("quiz payload")
}

fn question(text: &str, options: &[&str]) -> Question {
    Question {
        id: 99,
        question: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

fn assert_quiz_error<T: std::fmt::Debug>(result: Result<T, Error>, expected: QuizError) {
    match result {
        Err(Error::Quiz(err)) => assert_eq!(err, expected),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

async fn lesson_with_quiz(pool: &PgPool, title: &str) -> (Uuid, Uuid) {
    let lessons = LessonService::new(pool.clone());
    let lesson = lessons
        .create_lesson(CreateLessonPayload {
            title: "Arithmetic".into(),
            content: None,
        })
        .await
        .expect("create lesson");
    let quiz_id = QuizService::new(pool.clone())
        .create_new_quiz(lesson.id, new_quiz(title))
        .await
        .expect("create quiz");
    (lesson.id, quiz_id)
}

async fn count_quizzes_titled(pool: &PgPool, title: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE title = $1")
        .bind(title)
        .fetch_one(pool)
        .await
        .expect("count quizzes")
}

#[tokio::test]
async fn create_links_quiz_into_lesson_with_dense_ids() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (lesson_id, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;

    let lesson = LessonService::new(pool.clone())
        .get_lesson(lesson_id)
        .await
        .unwrap();
    assert_eq!(lesson.quiz_id, Some(quiz_id));

    let quiz = QuizService::new(pool.clone())
        .get_quiz_for_instructor(quiz_id)
        .await
        .unwrap();
    assert_eq!(quiz.answers.len(), quiz.questions.len());
    assert_eq!(
        quiz.questions.iter().map(|q| q.id).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(quiz.questions_per_quiz, 2);
}

#[tokio::test]
async fn failed_lesson_link_rolls_back_the_quiz() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let title = unique_title("Orphan");

    let result = QuizService::new(pool.clone())
        .create_new_quiz(Uuid::new_v4(), new_quiz(&title))
        .await;

    assert_quiz_error(result, QuizError::LessonNotFound);
    assert_eq!(count_quizzes_titled(&pool, &title).await, 0);
}

#[tokio::test]
async fn learner_view_is_a_shuffled_subset_without_answers() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (_, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let service = QuizService::new(pool.clone());

    let mut seen = HashSet::new();
    for _ in 0..25 {
        let view = service.get_quiz_for_learner(quiz_id).await.unwrap();
        assert_eq!(view.questions.len(), 2);
        assert!(serde_json::to_value(&view).unwrap().get("answers").is_none());

        let ids: Vec<i32> = view.questions.iter().map(|q| q.id).collect();
        let unique: HashSet<i32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| (0..3).contains(id)));
        seen.insert(ids);
    }
    assert!(seen.len() > 1);
}

#[tokio::test]
async fn correction_scores_and_checks_length() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (_, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let service = QuizService::new(pool.clone());

    let perfect = Submission::from([(0, "2".to_string()), (1, "4".to_string())]);
    let score = service.correct_quiz(quiz_id, &perfect).await.unwrap();
    assert_eq!(score.corrections, vec![true, true]);
    assert_eq!(score.answers, vec!["2".to_string(), "4".to_string()]);
    assert_eq!(score.score, 100.0);

    let half = Submission::from([(1, "4".to_string()), (2, "5".to_string())]);
    let score = service.correct_quiz(quiz_id, &half).await.unwrap();
    assert_eq!(score.corrections, vec![true, false]);
    assert_eq!(score.score, 50.0);

    let short = Submission::from([(0, "2".to_string())]);
    assert_quiz_error(
        service.correct_quiz(quiz_id, &short).await,
        QuizError::AnswerCountMismatch,
    );

    let long = Submission::from([
        (0, "2".to_string()),
        (1, "4".to_string()),
        (2, "6".to_string()),
    ]);
    assert_quiz_error(
        service.correct_quiz(quiz_id, &long).await,
        QuizError::AnswerCountMismatch,
    );

    assert_quiz_error(
        service.correct_quiz(Uuid::new_v4(), &perfect).await,
        QuizError::QuizNotFound,
    );
}

#[tokio::test]
async fn metadata_update_refuses_content_and_leaves_quiz_untouched() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (_, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let mut conn = pool.acquire().await.unwrap();
    let before = quizzes::get_quiz_for_creator(&mut conn, quiz_id).await.unwrap();

    let with_questions: QuizPatch = serde_json::from_value(json!({
        "questions": [{"question": "Q?", "options": ["a", "b"]}]
    }))
    .unwrap();
    assert_quiz_error(
        quizzes::update_quiz_metadata(&mut conn, quiz_id, &with_questions).await,
        QuizError::ForbiddenField,
    );

    let with_answers: QuizPatch = serde_json::from_value(json!({ "answers": ["a"] })).unwrap();
    assert_quiz_error(
        quizzes::update_quiz_metadata(&mut conn, quiz_id, &with_answers).await,
        QuizError::ForbiddenField,
    );

    let null_questions: QuizPatch =
        serde_json::from_value(json!({ "questions": null, "title": "Sneaky" })).unwrap();
    assert_quiz_error(
        quizzes::update_quiz_metadata(&mut conn, quiz_id, &null_questions).await,
        QuizError::ForbiddenField,
    );

    let after = quizzes::get_quiz_for_creator(&mut conn, quiz_id).await.unwrap();
    assert_eq!(after.questions, before.questions);
    assert_eq!(after.answers, before.answers);
    assert_eq!(after.updated_at, before.updated_at);

    let rename: QuizPatch =
        serde_json::from_value(json!({ "title": "Renamed", "time_to_finish": 15 })).unwrap();
    quizzes::update_quiz_metadata(&mut conn, quiz_id, &rename)
        .await
        .unwrap();
    let renamed = quizzes::get_quiz_for_creator(&mut conn, quiz_id).await.unwrap();
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.time_to_finish, 15);
    assert_eq!(renamed.questions_per_quiz, 2);

    assert_quiz_error(
        quizzes::update_quiz_metadata(&mut conn, Uuid::new_v4(), &rename).await,
        QuizError::QuizNotFound,
    );
}

#[tokio::test]
async fn question_edits_keep_ids_dense_and_answers_aligned() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (_, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let service = QuizService::new(pool.clone());

    let new_id = service
        .add_question(quiz_id, question("4+4?", &["8", "9"]), "8".into())
        .await
        .unwrap();
    assert_eq!(new_id, 3);

    service
        .update_question(quiz_id, 1, question("5+5?", &["10", "11"]), "10".into())
        .await
        .unwrap();

    service.remove_question(quiz_id, 0).await.unwrap();

    let quiz = service.get_quiz_for_instructor(quiz_id).await.unwrap();
    assert_eq!(
        quiz.questions.iter().map(|q| q.question.as_str()).collect::<Vec<_>>(),
        vec!["5+5?", "3+3?", "4+4?"]
    );
    assert_eq!(
        quiz.questions.iter().map(|q| q.id).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(quiz.answers, vec!["10", "6", "8"]);

    assert_quiz_error(
        service
            .update_question(quiz_id, 7, question("x", &["a", "b"]), "a".into())
            .await,
        QuizError::QuestionNotFound,
    );
    assert_quiz_error(
        service
            .add_question(quiz_id, question("x", &["a"]), "a".into())
            .await,
        QuizError::TooFewOptions,
    );
    assert_quiz_error(
        service.remove_question(quiz_id, 9).await,
        QuizError::QuestionNotFound,
    );

    service.remove_question(quiz_id, 0).await.unwrap();
    service.remove_question(quiz_id, 0).await.unwrap();
    assert_quiz_error(
        service.remove_question(quiz_id, 0).await,
        QuizError::NoQuestions,
    );
}

#[tokio::test]
async fn combined_update_is_all_or_nothing() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (_, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let service = QuizService::new(pool.clone());

    let patch: QuizPatch = serde_json::from_value(json!({
        "title": "Two questions",
        "questions_per_quiz": 1,
        "questions": [
            {"id": 5, "question": "Capital of France?", "options": ["Paris", "Rome"]},
            {"id": 5, "question": "Capital of Italy?", "options": ["Paris", "Rome"]}
        ],
        "answers": ["Paris", "Rome"]
    }))
    .unwrap();
    assert_eq!(service.update_quiz(quiz_id, patch).await.unwrap(), QUIZ_UPDATED);

    let quiz = service.get_quiz_for_instructor(quiz_id).await.unwrap();
    assert_eq!(quiz.title, "Two questions");
    assert_eq!(quiz.questions_per_quiz, 1);
    assert_eq!(
        quiz.questions.iter().map(|q| q.id).collect::<Vec<_>>(),
        vec![0, 1]
    );

    let rejected: QuizPatch = serde_json::from_value(json!({
        "questions": [{"question": "Lonely?", "options": ["yes", "no"]}],
        "answers": ["yes"],
        "difficulty": "hard"
    }))
    .unwrap();
    assert_quiz_error(
        service.update_quiz(quiz_id, rejected).await,
        QuizError::UnknownFields(vec!["difficulty".into()]),
    );

    let unchanged = service.get_quiz_for_instructor(quiz_id).await.unwrap();
    assert_eq!(unchanged.questions.len(), 2);
    assert_eq!(unchanged.answers, vec!["Paris", "Rome"]);
}

#[tokio::test]
async fn remove_quiz_unlinks_lesson() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (lesson_id, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let service = QuizService::new(pool.clone());

    assert_eq!(
        service.remove_quiz(quiz_id, lesson_id).await.unwrap(),
        QUIZ_REMOVED
    );
    let lesson = LessonService::new(pool.clone())
        .get_lesson(lesson_id)
        .await
        .unwrap();
    assert_eq!(lesson.quiz_id, None);

    assert_quiz_error(
        service.get_quiz_for_instructor(quiz_id).await,
        QuizError::QuizNotFound,
    );
    assert_quiz_error(
        service.remove_quiz(quiz_id, lesson_id).await,
        QuizError::QuizNotFound,
    );
}

#[tokio::test]
async fn removing_quiz_with_unknown_lesson_keeps_the_quiz() {
    let Some(pool) = common::setup_pool().await else {
        return;
    };
    let (_, quiz_id) = lesson_with_quiz(&pool, &unique_title("Math")).await;
    let service = QuizService::new(pool.clone());

    assert_quiz_error(
        service.remove_quiz(quiz_id, Uuid::new_v4()).await,
        QuizError::LessonNotFound,
    );
    assert!(service.get_quiz_for_instructor(quiz_id).await.is_ok());
}
