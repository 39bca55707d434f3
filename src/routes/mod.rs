use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;

mod auth;
mod health;
mod middleware_auth;
mod reports;
mod tasks;
mod users;

pub use health::health;

use crate::routes::auth::{login, profile, register, update_profile};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let task_router = Router::new()
        .route("/", post(tasks::routes::create).get(tasks::routes::list))
        .route(
            "/{id}",
            get(tasks::routes::get)
                .put(tasks::routes::update)
                .delete(tasks::routes::delete),
        )
        .route("/{id}/progress", patch(tasks::routes::update_progress))
        .route("/{id}/todos", patch(tasks::routes::update_todos));

    let user_router = Router::new()
        .route("/", get(users::routes::list))
        .route(
            "/{id}",
            get(users::routes::get)
                .put(users::routes::update)
                .delete(users::routes::delete),
        );

    let report_router = Router::new()
        .route("/tasks", get(reports::routes::task_report))
        .route("/export", get(reports::routes::export_tasks));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .nest(
            "/api",
            Router::new()
                .route("/profile", get(profile).put(update_profile))
                .nest("/tasks", task_router)
                .nest("/users", user_router)
                .nest("/reports", report_router)
                .layer(middleware::from_fn_with_state(
                    state,
                    middleware_auth::require_auth,
                )),
        )
        .layer(CorsLayer::permissive())
}

async fn root() -> &'static str {
    "Task Tracker API"
}
