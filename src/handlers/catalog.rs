// src/handlers/catalog.rs
//
// Small read-only lists backing the frontend dropdowns.

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{error::AppError, models::legacy::LegacyStore, models::user::StudentEntry};

/// Lists all student accounts.
pub async fn list_students(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, StudentEntry>(
        "SELECT id, username, email FROM users WHERE role = 'student' ORDER BY username",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "total_count": students.len(),
        "students": students
    })))
}

/// Fixed class-section catalog. There is no sections table yet; the values
/// match what the frontend has hardcoded.
pub async fn list_sections() -> impl IntoResponse {
    let sections = json!([
        { "id": 1, "name": "Section A", "description": "Beginner Level" },
        { "id": 2, "name": "Section B", "description": "Intermediate Level" },
        { "id": 3, "name": "Section C", "description": "Advanced Level" },
        { "id": 4, "name": "Section D", "description": "Expert Level" }
    ]);

    Json(json!({
        "total_count": 4,
        "sections": sections
    }))
}

/// Distinct complexity labels from the legacy question bank.
pub async fn list_complexities(
    State(pool): State<SqlitePool>,
) -> Result<impl IntoResponse, AppError> {
    let names = LegacyStore::new(&pool).complexities().await?;

    let complexities: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| json!({ "id": idx + 1, "name": name }))
        .collect();

    Ok(Json(json!({
        "total_count": complexities.len(),
        "complexities": complexities
    })))
}
