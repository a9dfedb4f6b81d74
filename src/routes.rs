// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assignment, auth, catalog, exercise, legacy, live_session},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, sessions, assignments, legacy, catalogs).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, notifier).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login));

    let session_routes = Router::new()
        .route("/live-sessions/", post(live_session::create_session))
        .route("/live-sessions/{code}/join/", post(live_session::join_session))
        .route(
            "/live-sessions/{code}/current/",
            get(live_session::current_question),
        )
        .route(
            "/live-sessions/{code}/advance/",
            post(live_session::advance_session),
        )
        .route("/live-sessions/{code}/end/", post(live_session::end_session));

    let assignment_routes = Router::new()
        .route(
            "/assignments/",
            post(assignment::create_assignment).get(assignment::list_assignments),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let exercise_routes = Router::new()
        .route("/exercises/", post(exercise::create_exercise))
        .route("/exercises/{id}/questions/", get(exercise::exercise_questions));

    let legacy_routes = Router::new()
        .route("/questions/", post(legacy::assign_from_legacy))
        .route(
            "/assigned/",
            get(legacy::list_assigned).post(legacy::assign_simple),
        )
        .route("/assigned/copy/", post(legacy::copy_direct));

    Router::new()
        .nest("/auth", auth_routes)
        .merge(session_routes)
        .merge(assignment_routes)
        .merge(exercise_routes)
        .nest("/legacy", legacy_routes)
        .route("/students/", get(catalog::list_students))
        .route("/sections/", get(catalog::list_sections))
        .route("/complexities/", get(catalog::list_complexities))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
