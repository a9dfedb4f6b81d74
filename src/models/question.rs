// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'questions' table: the bank of drill questions the
/// assignment builder and live sessions pick from.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Concept/complexity label, e.g. "addition".
    pub concept: String,

    /// The text content of the question.
    pub content: String,

    /// Length of the question (digits or terms).
    pub length_of_question: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
