use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    AppState, add_history, delete_history, health, list_history, list_printers, refresh_printers,
    set_refresh_interval,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/printers", get(list_printers))
        .route("/printers/refresh", post(refresh_printers))
        .route("/printers/{id}/history", get(list_history).post(add_history))
        .route("/history/{id}", delete(delete_history))
        .route("/settings/refresh-interval", put(set_refresh_interval))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
