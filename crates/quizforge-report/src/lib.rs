//! quizforge-report: rendering of session reports beyond JSON and markdown.

pub mod html;
