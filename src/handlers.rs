use crate::clock::{read_clock, ClockReading};
use crate::errors::AppError;
use crate::models::{
    ChangeResponse, CityRequest, CityResponse, ConfirmRequest, TaskCounts, TaskListResponse,
    TextRequest,
};
use crate::state::AppState;
use crate::tasks::TaskId;
use crate::ui::{render_index, PageContext};
use crate::weather::WeatherReport;
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    let page = PageContext {
        rows_html: session.rows().to_html(),
        counts: session.counts(),
        clock: read_clock(),
        city: session.weather_city().to_string(),
    };
    Html(render_index(&page))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<TaskListResponse> {
    let session = state.session.lock().await;
    Json(TaskListResponse {
        tasks: session.task_views(),
        counts: session.counts(),
    })
}

pub async fn get_counts(State(state): State<AppState>) -> Json<TaskCounts> {
    let session = state.session.lock().await;
    Json(session.counts())
}

pub async fn add_task(
    State(state): State<AppState>,
    Json(payload): Json<TextRequest>,
) -> Result<Json<ChangeResponse>, AppError> {
    let mut session = state.session.lock().await;
    let response = session.add_task(&payload.text).await?;
    Ok(Json(response))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Json<ChangeResponse> {
    let mut session = state.session.lock().await;
    Json(session.toggle_task(id).await)
}

pub async fn edit_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(payload): Json<TextRequest>,
) -> Json<ChangeResponse> {
    let mut session = state.session.lock().await;
    Json(session.edit_task(id, &payload.text).await)
}

pub async fn remove_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    payload: Option<Json<ConfirmRequest>>,
) -> Json<ChangeResponse> {
    let confirmed = confirmed(payload);
    let mut session = state.session.lock().await;
    Json(session.remove_task(id, &confirmed).await)
}

pub async fn clear_tasks(
    State(state): State<AppState>,
    payload: Option<Json<ConfirmRequest>>,
) -> Json<ChangeResponse> {
    let confirmed = confirmed(payload);
    let mut session = state.session.lock().await;
    Json(session.clear_tasks(&confirmed).await)
}

pub async fn get_clock() -> Json<ClockReading> {
    Json(read_clock())
}

pub async fn get_weather(State(state): State<AppState>) -> Result<Json<WeatherReport>, AppError> {
    let city = state.session.lock().await.weather_city().to_string();
    // The session lock is released before the network call.
    match state.weather.current(&city).await {
        Ok(report) => Ok(Json(report)),
        Err(err) => {
            warn!(city = %city, "weather lookup failed: {err}");
            Err(err.into())
        }
    }
}

pub async fn set_city(
    State(state): State<AppState>,
    Json(payload): Json<CityRequest>,
) -> Result<Json<CityResponse>, AppError> {
    let mut session = state.session.lock().await;
    let (city, warning) = session
        .set_weather_city(&payload.city)
        .await
        .ok_or_else(|| AppError::bad_request("city must not be empty"))?;
    Ok(Json(CityResponse { city, warning }))
}

fn confirmed(payload: Option<Json<ConfirmRequest>>) -> bool {
    payload.map(|Json(body)| body.confirmed).unwrap_or(false)
}
