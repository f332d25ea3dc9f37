pub mod lesson;
pub mod quiz;
