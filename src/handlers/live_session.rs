// src/handlers/live_session.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{AppError, FieldErrors, is_unique_violation, require_min_1, require_text},
    models::{
        live_session::{
            AssignedQuestion, CreateLiveSessionRequest, JoinSessionRequest, LiveSession,
            LiveSessionDetail,
        },
        question::Question,
    },
    utils::code::session_code,
};

const SESSION_COLS: &str = "id, session_code, teacher_identifier, student_identifier, concept, \
     length_of_question, speed, current_index, is_active, created_at";

const ASSIGNED_COLS: &str =
    "id, session_code, legacy_serial, content, order_index, is_answered, assigned_at";

const QUESTION_COLS: &str = "id, concept, content, length_of_question, created_at";

/// Redraw budget for session-code collisions. One collision is already
/// vanishingly rare with 62^8 codes.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Creates a live session: picks questions from the bank, draws a unique
/// session code and persists the session together with its ordered question
/// snapshots in one transaction.
pub async fn create_session(
    State(pool): State<SqlitePool>,
    Json(req): Json<CreateLiveSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = FieldErrors::new();
    let teacher_identifier =
        require_text(&mut errors, "teacher_identifier", req.teacher_identifier.as_deref());
    let concept = require_text(&mut errors, "concept", req.concept.as_deref());
    let length = require_min_1(&mut errors, "length_of_question", req.length_of_question);
    let count = require_min_1(&mut errors, "number_of_questions", req.number_of_questions);
    let speed = require_min_1(&mut errors, "speed", req.speed);

    let (Some(teacher_identifier), Some(concept), Some(length), Some(count), Some(speed)) =
        (teacher_identifier, concept, length, count, speed)
    else {
        return Err(AppError::Validation(errors));
    };

    let selected = select_bank_questions(&pool, &concept, length, count).await?;

    // The unique constraint on session_code is the source of truth; a fresh
    // code is drawn and the whole write retried on an insert collision.
    let mut attempts = 0;
    let code = loop {
        attempts += 1;
        let code = session_code();

        let mut tx = pool.begin().await?;
        let inserted = sqlx::query(
            "INSERT INTO live_sessions (session_code, teacher_identifier, concept, length_of_question, speed) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&code)
        .bind(&teacher_identifier)
        .bind(&concept)
        .bind(length)
        .bind(speed)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                if !selected.is_empty() {
                    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                        "INSERT INTO assigned_questions (session_code, content, order_index) ",
                    );
                    builder.push_values(selected.iter().enumerate(), |mut b, (idx, q)| {
                        b.push_bind(&code).push_bind(&q.content).push_bind(idx as i64);
                    });
                    builder.build().execute(&mut *tx).await?;
                }
                tx.commit().await?;
                break code;
            }
            Err(e) if is_unique_violation(&e) && attempts < MAX_CODE_ATTEMPTS => {
                tracing::warn!(attempts, "session code collision, redrawing");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    };

    let detail = load_session_detail(&pool, &code).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Attaches a student to an active session.
pub async fn join_session(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
    Json(req): Json<JoinSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(student) = req
        .student_identifier
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Err(AppError::field("student_identifier", "This field is required."));
    };

    let done = sqlx::query(
        "UPDATE live_sessions SET student_identifier = ? WHERE session_code = ? AND is_active = 1",
    )
    .bind(student)
    .bind(&code)
    .execute(&pool)
    .await?;

    if done.rows_affected() == 0 {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    Ok(Json(load_session_detail(&pool, &code).await?))
}

/// Returns the assigned question at the session's current index.
pub async fn current_question(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = fetch_active_session(&pool, &code).await?;

    let question = assigned_at(&pool, &code, session.current_index)
        .await?
        .ok_or_else(|| AppError::NotFound("No questions assigned".to_string()))?;

    Ok(Json(question))
}

/// Moves the session pointer to the next question.
///
/// The last question is a terminal marker, not an error: advancing past it
/// answers 200 with `{"detail": "End of session"}` and leaves state untouched.
/// The increment itself is a conditional UPDATE keyed on the index just
/// observed, so two racing advances cannot both move the pointer.
pub async fn advance_session(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    loop {
        let session = fetch_active_session(&pool, &code).await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM assigned_questions WHERE session_code = ?")
                .bind(&code)
                .fetch_one(&pool)
                .await?;

        if total == 0 {
            return Err(AppError::BadRequest("No questions to advance".to_string()));
        }
        if session.current_index + 1 >= total {
            return Ok(Json(json!({ "detail": "End of session" })).into_response());
        }

        let done = sqlx::query(
            "UPDATE live_sessions SET current_index = ? \
             WHERE session_code = ? AND is_active = 1 AND current_index = ?",
        )
        .bind(session.current_index + 1)
        .bind(&code)
        .bind(session.current_index)
        .execute(&pool)
        .await?;

        if done.rows_affected() == 1 {
            let question = assigned_at(&pool, &code, session.current_index + 1)
                .await?
                .ok_or_else(|| AppError::NotFound("No questions assigned".to_string()))?;
            return Ok(Json(question).into_response());
        }

        // Lost the race against a concurrent advance or end; re-read.
    }
}

/// Deactivates a session. Ending an already-inactive or unknown session is a
/// 404, never a silent success.
pub async fn end_session(
    State(pool): State<SqlitePool>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let done =
        sqlx::query("UPDATE live_sessions SET is_active = 0 WHERE session_code = ? AND is_active = 1")
            .bind(&code)
            .execute(&pool)
            .await?;

    if done.rows_affected() == 0 {
        return Err(AppError::NotFound("Session not found".to_string()));
    }

    Ok(Json(json!({ "detail": "Session ended" })))
}

/// Ordered selection from the question bank: exact concept+length matches
/// first, then backfill from the same concept ignoring length. May return
/// fewer than `count` rows; the legacy contract accepts partial sets here.
async fn select_bank_questions(
    pool: &SqlitePool,
    concept: &str,
    length: i64,
    count: i64,
) -> Result<Vec<Question>, AppError> {
    let sql = format!(
        "SELECT {QUESTION_COLS} FROM questions \
         WHERE concept = ? AND length_of_question = ? ORDER BY id LIMIT ?"
    );
    let mut selected = sqlx::query_as::<_, Question>(&sql)
        .bind(concept)
        .bind(length)
        .bind(count)
        .fetch_all(pool)
        .await?;

    let remaining = count - selected.len() as i64;
    if remaining > 0 {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {QUESTION_COLS} FROM questions WHERE concept = "
        ));
        builder.push_bind(concept);
        if !selected.is_empty() {
            builder.push(" AND id NOT IN (");
            let mut sep = builder.separated(", ");
            for q in &selected {
                sep.push_bind(q.id);
            }
            sep.push_unseparated(")");
        }
        builder.push(" ORDER BY id LIMIT ").push_bind(remaining);

        let extra: Vec<Question> = builder.build_query_as().fetch_all(pool).await?;
        selected.extend(extra);
    }

    Ok(selected)
}

async fn fetch_active_session(pool: &SqlitePool, code: &str) -> Result<LiveSession, AppError> {
    let sql = format!(
        "SELECT {SESSION_COLS} FROM live_sessions WHERE session_code = ? AND is_active = 1"
    );
    sqlx::query_as::<_, LiveSession>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}

async fn assigned_at(
    pool: &SqlitePool,
    code: &str,
    order_index: i64,
) -> Result<Option<AssignedQuestion>, AppError> {
    let sql = format!(
        "SELECT {ASSIGNED_COLS} FROM assigned_questions \
         WHERE session_code = ? AND order_index = ?"
    );
    Ok(sqlx::query_as::<_, AssignedQuestion>(&sql)
        .bind(code)
        .bind(order_index)
        .fetch_optional(pool)
        .await?)
}

async fn load_session_detail(pool: &SqlitePool, code: &str) -> Result<LiveSessionDetail, AppError> {
    let sql = format!("SELECT {SESSION_COLS} FROM live_sessions WHERE session_code = ?");
    let session = sqlx::query_as::<_, LiveSession>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let sql = format!(
        "SELECT {ASSIGNED_COLS} FROM assigned_questions \
         WHERE session_code = ? ORDER BY order_index"
    );
    let assigned_questions = sqlx::query_as::<_, AssignedQuestion>(&sql)
        .bind(code)
        .fetch_all(pool)
        .await?;

    Ok(LiveSessionDetail {
        session,
        assigned_questions,
    })
}
