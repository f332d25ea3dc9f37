pub mod lessons;
pub mod quizzes;
