pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod render;
pub mod session;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod ui;
pub mod state;
pub mod weather;

pub use app::router;
pub use config::Config;
pub use session::Session;
pub use state::AppState;
pub use storage::FileStore;
