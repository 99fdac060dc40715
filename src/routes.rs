// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, assessments, courses, labs, projects, tutor},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Catalog reads (courses, labs, tests) are public.
/// * Progress, sandbox, tutor and admin routes require a bearer token.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let course_routes = Router::new()
        .route("/", get(courses::list_courses))
        .route("/{course_id}", get(courses::get_course))
        // Protected course routes
        .merge(
            Router::new()
                .route("/{course_id}/progress", get(courses::get_progress))
                .route(
                    "/{course_id}/lessons/{lesson_id}/completion",
                    put(courses::complete_lesson).delete(courses::uncomplete_lesson),
                )
                .route(
                    "/{course_id}/lessons/{lesson_id}/toggle",
                    post(courses::toggle_lesson),
                )
                .route("/{course_id}/eligibility", get(courses::get_eligibility))
                .route_layer(auth.clone()),
        );

    let lab_routes = Router::new()
        .route("/{lab_id}", get(labs::get_lab))
        .merge(
            Router::new()
                .route("/{lab_id}/progress", get(labs::get_lab_progress))
                .route("/{lab_id}/draft", put(labs::save_draft))
                .route("/{lab_id}/run", post(labs::run_lab))
                .route_layer(auth.clone()),
        );

    let sandbox_routes = Router::new()
        .route("/execute", post(labs::execute_code))
        .route_layer(auth.clone());

    let test_routes = Router::new()
        .route("/{test_id}", get(assessments::get_test))
        .merge(
            Router::new()
                .route(
                    "/{test_id}/attempt",
                    post(assessments::submit_attempt).get(assessments::get_attempt),
                )
                .route_layer(auth.clone()),
        );

    let project_routes = Router::new()
        .route(
            "/{project_id}/submission",
            get(projects::get_submission).post(projects::submit_project),
        )
        .route_layer(auth.clone());

    let tutor_routes = Router::new()
        .route("/ask", post(tutor::ask_tutor))
        .route_layer(auth.clone());

    let admin_routes = Router::new()
        .route(
            "/students/{student_id}/attempts/{test_id}",
            delete(admin::clear_attempt),
        )
        // Double middleware protection: Auth first, then Admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(auth);

    Router::new()
        .nest("/api/courses", course_routes)
        .nest("/api/labs", lab_routes)
        .nest("/api/sandbox", sandbox_routes)
        .nest("/api/tests", test_routes)
        .nest("/api/projects", project_routes)
        .nest("/api/tutor", tutor_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
