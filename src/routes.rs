// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, course, hinter, staff},
    state::AppState,
    utils::jwt::{auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, courses, hinter block handlers).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // The hinter plugin surface, mounted per block under its course.
    let hinter_routes = Router::new()
        .route("/get_hint", post(hinter::get_hint))
        .route("/add_new_hint", post(hinter::add_new_hint))
        .route("/rate_hint", post(hinter::rate_hint))
        .route(
            "/get_used_hint_answer_data",
            post(hinter::get_used_hint_answer_data),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        // Instructor view of the crowd's hints
        .merge(
            Router::new()
                .route("/hints", get(staff::list_hints))
                .route("/unreport_hint", post(staff::unreport_hint))
                // Double middleware protection: Auth first, then Staff check
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let course_routes = Router::new()
        .route("/{course_id}", get(course::get_course))
        // Protected course routes
        .merge(
            Router::new()
                .route("/{course_id}/enroll", post(course::enroll))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        // Staff-side course authoring
        .merge(
            Router::new()
                .route("/", post(course::create_course))
                .route("/{course_id}/blocks", post(course::create_block))
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .nest("/{course_id}/hinter/{block_name}", hinter_routes);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
