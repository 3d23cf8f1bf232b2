use crate::tasks::TaskError;
use crate::weather::WeatherError;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
