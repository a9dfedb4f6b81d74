// src/models/live_session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'live_sessions' table: a stateful pointer over an ordered
/// sequence of assigned questions, shared between a teacher and a student.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LiveSession {
    pub id: i64,

    /// Public handle for the session: 8 random alphanumeric characters,
    /// unique across all sessions ever created.
    pub session_code: String,

    pub teacher_identifier: String,

    /// Empty until a student joins.
    pub student_identifier: String,

    pub concept: String,

    pub length_of_question: i64,

    pub speed: i64,

    /// 0-based pointer to the current question in the session.
    pub current_index: i64,

    /// Flips to false exactly once, on `end`.
    pub is_active: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Ordered question snapshot belonging to a live session
/// ('assigned_questions' table).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssignedQuestion {
    pub id: i64,
    pub session_code: String,
    pub legacy_serial: String,
    pub content: String,
    /// 0-based order in session.
    pub order_index: i64,
    pub is_answered: bool,
    pub assigned_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Session plus its ordered questions, the shape every session endpoint
/// responds with.
#[derive(Debug, Serialize)]
pub struct LiveSessionDetail {
    #[serde(flatten)]
    pub session: LiveSession,
    pub assigned_questions: Vec<AssignedQuestion>,
}

/// DTO for creating a live session. Fields are optional so absence is
/// reported per-field instead of failing body deserialization.
#[derive(Debug, Deserialize)]
pub struct CreateLiveSessionRequest {
    pub teacher_identifier: Option<String>,
    pub concept: Option<String>,
    pub length_of_question: Option<i64>,
    pub number_of_questions: Option<i64>,
    pub speed: Option<i64>,
}

/// DTO for joining a session.
#[derive(Debug, Deserialize, Default)]
pub struct JoinSessionRequest {
    pub student_identifier: Option<String>,
}
