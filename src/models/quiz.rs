use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::QuizError;

/// A question embedded in a quiz.
///
/// `id` is the question's zero-based position as of the last structural
/// change of the list. Caller-supplied ids are discarded on create/add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub questions: Vec<Question>,
    pub answers: Vec<String>,
    pub questions_per_quiz: i32,
    pub time_to_finish: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct QuizRow {
    pub id: Uuid,
    pub title: String,
    pub questions: Json<Vec<Question>>,
    pub answers: Json<Vec<String>>,
    pub questions_per_quiz: i32,
    pub time_to_finish: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            questions: row.questions.0,
            answers: row.answers.0,
            questions_per_quiz: row.questions_per_quiz,
            time_to_finish: row.time_to_finish,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// What a learner receives when starting an attempt. Carries no answers.
#[derive(Debug, Clone, Serialize)]
pub struct LearnerQuiz {
    pub id: Uuid,
    pub title: String,
    pub questions: Vec<Question>,
    pub questions_per_quiz: i32,
    pub time_to_finish: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Learner submission: delivered question id -> chosen answer.
pub type Submission = BTreeMap<i32, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizScore {
    pub corrections: Vec<bool>,
    pub answers: Vec<String>,
    pub score: f64,
}

fn default_questions_per_quiz() -> i32 {
    1
}

/// Payload for creating a quiz. Keys outside the schema land in `unknown`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuiz {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default = "default_questions_per_quiz")]
    pub questions_per_quiz: i32,
    pub time_to_finish: Option<i32>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, JsonValue>,
}

impl NewQuiz {
    pub fn validate(&self) -> Result<(), QuizError> {
        reject_unknown(&self.unknown)?;
        if !self.questions.is_empty() && self.answers.len() != self.questions.len() {
            return Err(QuizError::MissingAnswers);
        }
        validate_questions(&self.questions)?;
        if self.title.trim().is_empty() {
            return Err(QuizError::MissingField("title"));
        }
        match self.time_to_finish {
            None => return Err(QuizError::MissingField("time_to_finish")),
            Some(minutes) => ensure_positive("time_to_finish", minutes)?,
        }
        ensure_positive("questions_per_quiz", self.questions_per_quiz)
    }
}

/// Distinguishes a key sent as `null` (`Some(None)`) from an absent key
/// (`None`, via `#[serde(default)]`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of a quiz. Only the metadata fields may be applied
/// directly; `questions` and `answers` are accepted here so that a combined
/// update can peel them off with [`QuizPatch::take_content`]. Those two keep
/// track of key presence, so `{"questions": null}` still counts as sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizPatch {
    pub title: Option<String>,
    pub questions_per_quiz: Option<i32>,
    pub time_to_finish: Option<i32>,
    #[serde(default, deserialize_with = "present")]
    pub questions: Option<Option<Vec<Question>>>,
    #[serde(default, deserialize_with = "present")]
    pub answers: Option<Option<Vec<String>>>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, JsonValue>,
}

impl QuizPatch {
    pub fn validate_metadata(&self) -> Result<(), QuizError> {
        reject_unknown(&self.unknown)?;
        if self.questions.is_some() || self.answers.is_some() {
            return Err(QuizError::ForbiddenField);
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(QuizError::MissingField("title"));
            }
        }
        if let Some(count) = self.questions_per_quiz {
            ensure_positive("questions_per_quiz", count)?;
        }
        if let Some(minutes) = self.time_to_finish {
            ensure_positive("time_to_finish", minutes)?;
        }
        Ok(())
    }

    /// Removes `questions` and `answers` from the patch. They travel together
    /// or not at all; a `null` array counts as missing.
    pub fn take_content(&mut self) -> Result<Option<(Vec<Question>, Vec<String>)>, QuizError> {
        match (self.questions.take(), self.answers.take()) {
            (None, None) => Ok(None),
            (Some(Some(questions)), Some(Some(answers))) => Ok(Some((questions, answers))),
            (Some(None), _) => Err(QuizError::NoQuestions),
            _ => Err(QuizError::MissingAnswers),
        }
    }
}

/// A single question together with its correct answer.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionAndAnswer {
    pub question: Question,
    pub answer: String,
}

fn reject_unknown(unknown: &BTreeMap<String, JsonValue>) -> Result<(), QuizError> {
    if unknown.is_empty() {
        return Ok(());
    }
    Err(QuizError::UnknownFields(unknown.keys().cloned().collect()))
}

fn ensure_positive(field: &'static str, value: i32) -> Result<(), QuizError> {
    if value < 1 {
        return Err(QuizError::InvalidField(field));
    }
    Ok(())
}

pub fn validate_question(question: &Question) -> Result<(), QuizError> {
    if question.question.trim().is_empty() {
        return Err(QuizError::MissingField("question"));
    }
    if question.options.len() < 2 {
        return Err(QuizError::TooFewOptions);
    }
    Ok(())
}

pub fn validate_questions(questions: &[Question]) -> Result<(), QuizError> {
    if questions.is_empty() {
        return Err(QuizError::NoQuestions);
    }
    questions.iter().try_for_each(validate_question)
}

/// Validation for a whole-content replacement of a quiz.
pub fn validate_content(questions: &[Question], answers: &[String]) -> Result<(), QuizError> {
    if !questions.is_empty() && answers.len() != questions.len() {
        return Err(QuizError::MissingAnswers);
    }
    validate_questions(questions)
}

/// Re-derives every question id from its position.
pub fn renumber(mut questions: Vec<Question>) -> Vec<Question> {
    for (idx, question) in questions.iter_mut().enumerate() {
        question.id = idx as i32;
    }
    questions
}

impl Quiz {
    /// Number of questions a learner is served per attempt.
    pub fn delivered_count(&self) -> usize {
        (self.questions_per_quiz.max(0) as usize).min(self.questions.len())
    }

    fn position_of(&self, question_id: i32) -> Result<usize, QuizError> {
        self.questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or(QuizError::QuestionNotFound)
    }

    /// Shuffles the full question list and keeps the first
    /// `questions_per_quiz` entries. Answers never leave this function.
    pub fn into_learner_view<R: Rng + ?Sized>(self, rng: &mut R) -> LearnerQuiz {
        let keep = self.delivered_count();
        let mut questions = self.questions;
        questions.shuffle(rng);
        questions.truncate(keep);

        LearnerQuiz {
            id: self.id,
            title: self.title,
            questions,
            questions_per_quiz: self.questions_per_quiz,
            time_to_finish: self.time_to_finish,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Replaces the question with the given id and its answer, keeping the id.
    pub fn replace_question(
        &mut self,
        question_id: i32,
        mut question: Question,
        answer: String,
    ) -> Result<(), QuizError> {
        let position = self.position_of(question_id)?;
        validate_question(&question)?;
        question.id = question_id;
        self.questions[position] = question;
        if position >= self.answers.len() {
            self.answers.resize(position + 1, String::new());
        }
        self.answers[position] = answer;
        Ok(())
    }

    /// Drops the question with the given id and the answer in the same slot,
    /// then renumbers what is left.
    pub fn remove_question(&mut self, question_id: i32) -> Result<(), QuizError> {
        let position = self.position_of(question_id)?;
        if self.questions.len() == 1 {
            return Err(QuizError::NoQuestions);
        }
        self.questions.remove(position);
        if position < self.answers.len() {
            self.answers.remove(position);
        }
        self.questions = renumber(std::mem::take(&mut self.questions));
        Ok(())
    }

    /// Scores a submission keyed by the ids of the delivered questions.
    pub fn correct(&self, submission: &Submission) -> Result<QuizScore, QuizError> {
        let expected = self.delivered_count();
        if expected == 0 || submission.len() != expected {
            return Err(QuizError::AnswerCountMismatch);
        }

        let mut corrections = Vec::with_capacity(expected);
        let mut answers = Vec::with_capacity(expected);
        for (question_id, given) in submission {
            let position = self.position_of(*question_id)?;
            let correct = self
                .answers
                .get(position)
                .ok_or(QuizError::MissingAnswers)?;
            corrections.push(given == correct);
            answers.push(correct.clone());
        }

        let right = corrections.iter().filter(|c| **c).count();
        let score = (right as f64 / expected as f64) * 100.0;
        Ok(QuizScore {
            corrections,
            answers,
            score,
        })
    }
}
