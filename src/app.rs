use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, patch, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/tasks",
            get(handlers::list_tasks)
                .post(handlers::add_task)
                .delete(handlers::clear_tasks),
        )
        .route(
            "/api/tasks/:id",
            patch(handlers::edit_task).delete(handlers::remove_task),
        )
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route("/api/counts", get(handlers::get_counts))
        .route("/api/clock", get(handlers::get_clock))
        .route("/api/weather", get(handlers::get_weather))
        .route("/api/weather/city", put(handlers::set_city))
        .with_state(state)
}
