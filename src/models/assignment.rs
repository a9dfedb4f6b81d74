// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Represents the 'assignments' table: a named batch of questions a teacher
/// hands to one student or a class section.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub teacher_id: i64,
    pub title: Option<String>,
    pub concept: String,
    pub length_of_question: i64,
    pub number_of_questions: i64,
    pub speed: i64,
    /// Free-form by convention 'individual' or 'class'; the original API never
    /// enforced a relationship with the target fields and neither do we.
    pub assign_type: String,
    pub target_student_id: Option<i64>,
    pub target_class_section: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One ordered item of an assignment, joined with its bank question.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssignmentItemDetail {
    pub id: i64,
    pub question_id: i64,
    /// 0-based order within the assignment.
    pub order_index: i64,
    pub is_answered: bool,
    pub concept: String,
    pub content: String,
    pub length_of_question: i64,
}

/// Assignment plus its ordered question items.
#[derive(Debug, Serialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub questions: Vec<AssignmentItemDetail>,
}

/// DTO for creating an assignment.
///
/// `target_student` accepts either a numeric id or a name, so it is taken as a
/// raw JSON value and resolved by the handler.
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub title: Option<String>,
    pub concept: Option<String>,
    pub length_of_question: Option<i64>,
    pub number_of_questions: Option<i64>,
    pub speed: Option<i64>,
    pub assign_type: Option<String>,
    pub target_student: Option<Value>,
    pub target_class_section: Option<String>,
}
