//! Survey module: question catalog and normalized responses.

pub mod catalog;
pub mod response;

pub use catalog::{QUESTIONS, Question, QuestionId, QuestionKind, options, questions};
pub use response::{Answer, SurveyResponse};
