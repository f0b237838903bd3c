use std::sync::Arc;

use axum::http::StatusCode;
use tracing::error;

pub mod health;
pub mod history;
pub mod printers;
pub mod settings;

pub use health::health;
pub use history::{add_history, delete_history, list_history};
pub use printers::{list_printers, refresh_printers};
pub use settings::set_refresh_interval;

use crate::scheduler::RefreshScheduler;
use crate::store::PrinterStore;

/// Общее состояние HTTP обработчиков
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PrinterStore>,
    pub scheduler: Arc<RefreshScheduler>,
}

pub type ApiError = (StatusCode, String);

/// Ошибка хранилища: в лог полностью, клиенту коротко
pub(crate) fn internal(e: anyhow::Error) -> ApiError {
    error!(error = %format!("{:#}", e), "ошибка обработки запроса");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
