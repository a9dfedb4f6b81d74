// tests/live_session_tests.rs

use std::collections::HashSet;
use std::sync::Arc;

use abacus_backend::{config::Config, routes, state::AppState, utils::notify::LogNotifier};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Spawns the app on a random port against a fresh in-memory database.
/// Returns the base URL and the pool (for direct seeding/inspection).
async fn spawn_app() -> (String, SqlitePool) {
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        notifier: Arc::new(LogNotifier),
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn seed_question(pool: &SqlitePool, concept: &str, content: &str, length: i64) {
    sqlx::query("INSERT INTO questions (concept, content, length_of_question) VALUES (?, ?, ?)")
        .bind(concept)
        .bind(content)
        .bind(length)
        .execute(pool)
        .await
        .unwrap();
}

async fn create_session(
    client: &reqwest::Client,
    address: &str,
    concept: &str,
    length: i64,
    count: i64,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/live-sessions/", address))
        .json(&serde_json::json!({
            "teacher_identifier": "teacher-1",
            "concept": concept,
            "length_of_question": length,
            "number_of_questions": count,
            "speed": 5
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn session_full_flow_three_questions() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        seed_question(&pool, "addition", &format!("2 + {}", i), 2).await;
    }

    // Create: 3 assigned questions, ordered 0, 1, 2.
    let session = create_session(&client, &address, "addition", 2, 3).await;
    let code = session["session_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 8);
    assert_eq!(session["current_index"], 0);
    assert_eq!(session["is_active"], true);

    let assigned = session["assigned_questions"].as_array().unwrap();
    assert_eq!(assigned.len(), 3);
    for (idx, q) in assigned.iter().enumerate() {
        assert_eq!(q["order_index"].as_i64().unwrap(), idx as i64);
        assert_eq!(q["is_answered"], false);
    }

    // Current points at index 0.
    let current: serde_json::Value = client
        .get(format!("{}/live-sessions/{}/current/", address, code))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["order_index"], 0);

    // Two advances reach index 2.
    for expected in [1, 2] {
        let response = client
            .post(format!("{}/live-sessions/{}/advance/", address, code))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["order_index"].as_i64().unwrap(), expected);
    }

    // A third advance is the end marker, state unchanged.
    let response = client
        .post(format!("{}/live-sessions/{}/advance/", address, code))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "End of session");

    let current: serde_json::Value = client
        .get(format!("{}/live-sessions/{}/current/", address, code))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["order_index"], 2);
}

#[tokio::test]
async fn create_session_reports_missing_fields() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/live-sessions/", address))
        .json(&serde_json::json!({ "concept": "addition" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    for field in [
        "teacher_identifier",
        "length_of_question",
        "number_of_questions",
        "speed",
    ] {
        assert!(body[field].is_array(), "expected error for {}", field);
    }
}

#[tokio::test]
async fn create_session_backfills_from_same_concept() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    seed_question(&pool, "addition", "1 + 1", 2).await;
    seed_question(&pool, "addition", "2 + 2", 2).await;
    seed_question(&pool, "addition", "100 + 100", 3).await;
    seed_question(&pool, "subtraction", "5 - 1", 2).await;

    let session = create_session(&client, &address, "addition", 2, 3).await;
    let assigned = session["assigned_questions"].as_array().unwrap();

    // Two exact matches, third slot backfilled from the same concept.
    assert_eq!(assigned.len(), 3);
    assert_eq!(assigned[0]["content"], "1 + 1");
    assert_eq!(assigned[1]["content"], "2 + 2");
    assert_eq!(assigned[2]["content"], "100 + 100");
}

#[tokio::test]
async fn join_unknown_session_is_404_with_detail() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/live-sessions/nosuchcd/join/", address))
        .json(&serde_json::json!({ "student_identifier": "student-1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn join_requires_student_identifier() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed_question(&pool, "addition", "1 + 1", 2).await;

    let session = create_session(&client, &address, "addition", 2, 1).await;
    let code = session["session_code"].as_str().unwrap();

    let response = client
        .post(format!("{}/live-sessions/{}/join/", address, code))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["student_identifier"].is_array());
}

#[tokio::test]
async fn join_attaches_student_to_active_session() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed_question(&pool, "addition", "1 + 1", 2).await;

    let session = create_session(&client, &address, "addition", 2, 1).await;
    let code = session["session_code"].as_str().unwrap();

    let response = client
        .post(format!("{}/live-sessions/{}/join/", address, code))
        .json(&serde_json::json!({ "student_identifier": "student-1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["student_identifier"], "student-1");
}

#[tokio::test]
async fn end_is_one_way_and_never_silent() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed_question(&pool, "addition", "1 + 1", 2).await;

    let session = create_session(&client, &address, "addition", 2, 1).await;
    let code = session["session_code"].as_str().unwrap();

    let response = client
        .post(format!("{}/live-sessions/{}/end/", address, code))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Session ended");

    // Ending again, joining, or reading an ended session all 404.
    let response = client
        .post(format!("{}/live-sessions/{}/end/", address, code))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .post(format!("{}/live-sessions/{}/join/", address, code))
        .json(&serde_json::json!({ "student_identifier": "student-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .get(format!("{}/live-sessions/{}/current/", address, code))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn advance_with_zero_questions_is_client_error() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // No bank questions for this concept: the session is created empty.
    let session = create_session(&client, &address, "division", 4, 2).await;
    let code = session["session_code"].as_str().unwrap();
    assert_eq!(session["assigned_questions"].as_array().unwrap().len(), 0);

    let response = client
        .post(format!("{}/live-sessions/{}/advance/", address, code))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "No questions to advance");
}

#[tokio::test]
async fn session_codes_are_distinct_across_sessions() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed_question(&pool, "addition", "1 + 1", 2).await;

    let mut codes = HashSet::new();
    for _ in 0..20 {
        let session = create_session(&client, &address, "addition", 2, 1).await;
        codes.insert(session["session_code"].as_str().unwrap().to_string());
    }
    assert_eq!(codes.len(), 20);
}
