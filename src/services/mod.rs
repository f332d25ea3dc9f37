pub mod lesson_service;
pub mod quiz_service;
