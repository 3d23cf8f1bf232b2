use crate::session::Session;
use crate::weather::WeatherClient;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub weather: WeatherClient,
}

impl AppState {
    pub fn new(session: Session, weather: WeatherClient) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            weather,
        }
    }
}
