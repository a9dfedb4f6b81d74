// src/handlers/assignment.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use rand::seq::SliceRandom;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{AppError, FieldErrors, require_min_1, require_text},
    models::{
        assignment::{Assignment, AssignmentDetail, AssignmentItemDetail, CreateAssignmentRequest},
        user::User,
    },
    utils::{jwt::Claims, notify::Notifier},
};

const ASSIGNMENT_COLS: &str = "id, teacher_id, title, concept, length_of_question, \
     number_of_questions, speed, assign_type, target_student_id, target_class_section, created_at";

const USER_COLS: &str = "id, username, password, role, email, full_name, created_at";

/// Creates an assignment for the authenticated teacher.
///
/// Draws a uniform without-replacement sample of exactly
/// `number_of_questions` bank questions matching the concept
/// (case-insensitively) and length. The assignment row and its items are
/// written in one transaction; too few candidates fails the whole operation
/// before anything is persisted.
pub async fn create_assignment(
    State(pool): State<SqlitePool>,
    State(notifier): State<Arc<dyn Notifier>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = FieldErrors::new();
    let concept = require_text(&mut errors, "concept", req.concept.as_deref());
    let length = require_min_1(&mut errors, "length_of_question", req.length_of_question);
    let count = require_min_1(&mut errors, "number_of_questions", req.number_of_questions);
    let speed = require_min_1(&mut errors, "speed", req.speed);

    let (Some(concept), Some(length), Some(count), Some(speed)) = (concept, length, count, speed)
    else {
        return Err(AppError::Validation(errors));
    };

    let teacher_id = claims.user_id()?;

    // assign_type is deliberately accepted as-is; the original API never tied
    // it to the target fields and existing clients rely on that.
    let assign_type = req
        .assign_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("individual")
        .to_string();

    let target_student = match &req.target_student {
        Some(value) => Some(resolve_student(&pool, value).await?),
        None => None,
    };

    let candidate_ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM questions WHERE LOWER(concept) = LOWER(?) AND length_of_question = ?",
    )
    .bind(&concept)
    .bind(length)
    .fetch_all(&pool)
    .await?;

    if (candidate_ids.len() as i64) < count {
        return Err(AppError::BadRequest(format!(
            "Not enough questions available: requested {}, found {}",
            count,
            candidate_ids.len()
        )));
    }

    let sample: Vec<i64> = candidate_ids
        .choose_multiple(&mut rand::thread_rng(), count as usize)
        .copied()
        .collect();

    let mut tx = pool.begin().await?;

    let done = sqlx::query(
        "INSERT INTO assignments (teacher_id, title, concept, length_of_question, \
         number_of_questions, speed, assign_type, target_student_id, target_class_section) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(teacher_id)
    .bind(&req.title)
    .bind(&concept)
    .bind(length)
    .bind(count)
    .bind(speed)
    .bind(&assign_type)
    .bind(target_student.as_ref().map(|s| s.id))
    .bind(&req.target_class_section)
    .execute(&mut *tx)
    .await?;
    let assignment_id = done.last_insert_rowid();

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO assignment_items (assignment_id, question_id, order_index) ");
    builder.push_values(sample.iter().enumerate(), |mut b, (idx, question_id)| {
        b.push_bind(assignment_id)
            .push_bind(question_id)
            .push_bind(idx as i64);
    });
    builder.build().execute(&mut *tx).await?;

    tx.commit().await?;

    // Best-effort notification; a failure here must not undo the assignment.
    if let Some(email) = target_student.as_ref().and_then(|s| s.email.as_deref()) {
        let title = req.title.as_deref().unwrap_or(&concept);
        if let Err(e) = notifier
            .assignment_created(email, &claims.username, title)
            .await
        {
            tracing::warn!(error = %e, assignment_id, "assignment notification failed");
        }
    }

    let detail = load_assignment_detail(&pool, assignment_id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Lists the authenticated teacher's assignments with their nested questions.
pub async fn list_assignments(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.user_id()?;

    let sql = format!(
        "SELECT {ASSIGNMENT_COLS} FROM assignments WHERE teacher_id = ? ORDER BY created_at DESC, id DESC"
    );
    let assignments = sqlx::query_as::<_, Assignment>(&sql)
        .bind(teacher_id)
        .fetch_all(&pool)
        .await?;

    let mut details = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let questions = load_items(&pool, assignment.id).await?;
        details.push(AssignmentDetail {
            assignment,
            questions,
        });
    }

    Ok(Json(details))
}

/// Resolves a `target_student` value: numeric id first, then name
/// (username or full name, case-insensitive).
async fn resolve_student(pool: &SqlitePool, value: &Value) -> Result<User, AppError> {
    let ident = match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(AppError::field(
                "target_student",
                "Must be a student id or name.",
            ));
        }
    };

    let sql_by_id = format!("SELECT {USER_COLS} FROM users WHERE id = ?");
    if let Ok(id) = ident.parse::<i64>() {
        if let Some(user) = sqlx::query_as::<_, User>(&sql_by_id)
            .bind(id)
            .fetch_optional(pool)
            .await?
        {
            return Ok(user);
        }
    }

    let sql_by_name = format!(
        "SELECT {USER_COLS} FROM users \
         WHERE LOWER(username) = LOWER(?) OR LOWER(full_name) = LOWER(?)"
    );
    sqlx::query_as::<_, User>(&sql_by_name)
        .bind(&ident)
        .bind(&ident)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Target student '{ident}' not found")))
}

async fn load_items(
    pool: &SqlitePool,
    assignment_id: i64,
) -> Result<Vec<AssignmentItemDetail>, AppError> {
    Ok(sqlx::query_as::<_, AssignmentItemDetail>(
        "SELECT i.id, i.question_id, i.order_index, i.is_answered, \
                q.concept, q.content, q.length_of_question \
         FROM assignment_items i \
         JOIN questions q ON q.id = i.question_id \
         WHERE i.assignment_id = ? \
         ORDER BY i.order_index",
    )
    .bind(assignment_id)
    .fetch_all(pool)
    .await?)
}

async fn load_assignment_detail(
    pool: &SqlitePool,
    assignment_id: i64,
) -> Result<AssignmentDetail, AppError> {
    let sql = format!("SELECT {ASSIGNMENT_COLS} FROM assignments WHERE id = ?");
    let assignment = sqlx::query_as::<_, Assignment>(&sql)
        .bind(assignment_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    let questions = load_items(pool, assignment_id).await?;

    Ok(AssignmentDetail {
        assignment,
        questions,
    })
}
