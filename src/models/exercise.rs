// src/models/exercise.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored abacus drill parameter set ('exercises' table).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub concept: String,
    pub length_of_question: i64,
    pub number_of_questions: i64,
    pub speed: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating an exercise. All fields are checked by hand so missing
/// ones surface as per-field messages rather than a body-level rejection.
#[derive(Debug, Deserialize)]
pub struct CreateExerciseRequest {
    pub concept: Option<String>,
    pub length_of_question: Option<i64>,
    pub number_of_questions: Option<i64>,
    pub speed: Option<i64>,
}
