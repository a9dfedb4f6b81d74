// src/handlers/legacy.rs
//
// Endpoints over the legacy question table. Request bodies arrive in the
// loose shape the old clients send: numbers may come as strings, and empty
// strings mean "not provided". All table access goes through `LegacyStore`.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    error::{AppError, FieldErrors},
    models::legacy::{AssignContext, AssignedFilter, LegacyStore},
};

#[derive(Debug, Deserialize)]
pub struct LegacyAssignRequest {
    pub concept: Option<Value>,
    pub length_of_question: Option<Value>,
    pub number_of_questions: Option<Value>,
    pub student_id: Option<Value>,
    pub teacher_id: Option<Value>,
    pub section_id: Option<Value>,
    pub speed: Option<Value>,
    pub activity_name: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AssignedListParams {
    pub concept: Option<String>,
    pub length: Option<String>,
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub activity_name: Option<String>,
}

/// Selects legacy questions for `(concept, length)` and copies them into the
/// assigned table tagged with the student/teacher/section/activity context.
///
/// Partial matches are returned as-is; only an empty result is an error (404),
/// unlike the stricter assigned-copy endpoint below.
pub async fn assign_from_legacy(
    State(pool): State<SqlitePool>,
    Json(req): Json<LegacyAssignRequest>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::new();
    let concept = required_text(&mut errors, "concept", &req.concept);
    let length = required_text(&mut errors, "length_of_question", &req.length_of_question);
    let activity_name = required_text(&mut errors, "activity_name", &req.activity_name);
    let limit = optional_positive_int(&mut errors, "number_of_questions", &req.number_of_questions);
    let speed = optional_positive_float(&mut errors, "speed", &req.speed);

    let (Some(concept), Some(length), Some(activity_name)) = (concept, length, activity_name)
    else {
        return Err(AppError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let store = LegacyStore::new(&pool);
    let questions = store.questions(&concept, &length, limit).await?;

    if questions.is_empty() {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "No questions found",
                "message": format!(
                    "No questions found with concept '{concept}' and length '{length}'"
                ),
                "concept": concept,
                "length_of_question": length,
                "suggestion": "Please check available concepts and lengths using GET /complexities/"
            })),
        )
            .into_response());
    }

    let ctx = AssignContext {
        student_id: optional_text(&req.student_id),
        teacher_id: optional_text(&req.teacher_id),
        section_id: optional_text(&req.section_id),
        activity_name: Some(activity_name.clone()),
        speed,
    };
    let inserted = store.assign(&questions, &ctx).await?;
    let total_count = questions.len();

    Ok(Json(json!({
        "questions": questions,
        "student_id": ctx.student_id,
        "teacher_id": ctx.teacher_id,
        "section_id": ctx.section_id,
        "speed": ctx.speed,
        "activity_name": activity_name,
        "concept": concept,
        "length_of_question": length,
        "number_of_questions": limit,
        "total_count": total_count,
        "message": format!("Successfully assigned {inserted} questions")
    }))
    .into_response())
}

/// Stricter copy variant: zero matching legacy rows is a 400, and the
/// response echoes back the assigned rows for the same scope.
pub async fn assign_simple(
    State(pool): State<SqlitePool>,
    Json(req): Json<LegacyAssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = FieldErrors::new();
    let concept = required_text(&mut errors, "concept", &req.concept);
    let length = required_text(&mut errors, "length_of_question", &req.length_of_question);
    let limit = optional_positive_int(&mut errors, "number_of_questions", &req.number_of_questions);

    let (Some(concept), Some(length)) = (concept, length) else {
        return Err(AppError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let store = LegacyStore::new(&pool);
    let questions = store.questions(&concept, &length, limit).await?;
    if questions.is_empty() {
        return Err(AppError::BadRequest("No matching questions found".to_string()));
    }

    let ctx = AssignContext {
        student_id: optional_text(&req.student_id),
        teacher_id: optional_text(&req.teacher_id),
        activity_name: optional_text(&req.activity_name),
        ..AssignContext::default()
    };
    let inserted = store.assign(&questions, &ctx).await?;

    let filter = AssignedFilter {
        complexity: Some(concept),
        length: Some(length),
        student_id: ctx.student_id.clone(),
        teacher_id: ctx.teacher_id.clone(),
        activity_name: ctx.activity_name.clone(),
    };
    let assigned = store.assigned(&filter).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("Successfully assigned {inserted} questions"),
            "assigned_questions": assigned
        })),
    ))
}

/// Lists assigned legacy rows, optionally filtered.
pub async fn list_assigned(
    State(pool): State<SqlitePool>,
    Query(params): Query<AssignedListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = AssignedFilter {
        complexity: params.concept,
        length: params.length,
        student_id: params.student_id,
        teacher_id: params.teacher_id,
        activity_name: params.activity_name,
    };

    let assigned = LegacyStore::new(&pool).assigned(&filter).await?;

    Ok(Json(json!({
        "total_count": assigned.len(),
        "assigned_questions": assigned
    })))
}

/// Deduplicating copy of legacy rows into the assigned table.
/// Reports the insert's own affected-row count.
pub async fn copy_direct(
    State(pool): State<SqlitePool>,
    Json(req): Json<LegacyAssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = FieldErrors::new();
    let concept = required_text(&mut errors, "concept", &req.concept);
    let length = required_text(&mut errors, "length_of_question", &req.length_of_question);
    let limit = optional_int(&mut errors, "number_of_questions", &req.number_of_questions);

    let (Some(concept), Some(length)) = (concept, length) else {
        return Err(AppError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let inserted = LegacyStore::new(&pool)
        .copy_missing(&concept, &length, limit)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "inserted": inserted }))))
}

// Loose-value helpers. Null and "" both mean absent, numbers may be sent as
// strings; this matches what the existing clients actually post.

fn present(value: &Option<Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}

fn optional_text(value: &Option<Value>) -> Option<String> {
    match present(value)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(errors: &mut FieldErrors, field: &str, value: &Option<Value>) -> Option<String> {
    match optional_text(value) {
        Some(v) => Some(v),
        None => {
            errors.insert(field.to_string(), vec!["This field is required.".to_string()]);
            None
        }
    }
}

fn optional_int(errors: &mut FieldErrors, field: &str, value: &Option<Value>) -> Option<i64> {
    let v = present(value)?;
    let parsed = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        errors.insert(field.to_string(), vec!["Must be an integer.".to_string()]);
    }
    parsed
}

fn optional_positive_int(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<Value>,
) -> Option<i64> {
    let parsed = optional_int(errors, field, value)?;
    if parsed <= 0 {
        errors.insert(
            field.to_string(),
            vec!["Must be greater than 0.".to_string()],
        );
        return None;
    }
    Some(parsed)
}

fn optional_positive_float(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<Value>,
) -> Option<f64> {
    let v = present(value)?;
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f > 0.0 => Some(f),
        Some(_) => {
            errors.insert(
                field.to_string(),
                vec!["Must be greater than 0.".to_string()],
            );
            None
        }
        None => {
            errors.insert(field.to_string(), vec!["Must be a number.".to_string()]);
            None
        }
    }
}
