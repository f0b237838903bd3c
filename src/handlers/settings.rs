use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState, internal};
use crate::config::check_refresh_minutes;

#[derive(Debug, Deserialize)]
pub struct RefreshInterval {
    pub interval_minutes: u64,
}

/// Сохраняет новый интервал и пересоздаёт таймер
pub async fn set_refresh_interval(
    State(state): State<AppState>,
    Json(body): Json<RefreshInterval>,
) -> Result<Json<Value>, ApiError> {
    check_refresh_minutes(body.interval_minutes).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .store
        .set_refresh_interval_minutes(body.interval_minutes)
        .await
        .map_err(internal)?;
    let active = state.scheduler.restart().await;

    Ok(Json(json!({ "interval_minutes": active })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::collector::PollResult;
    use crate::models::Device;
    use crate::scheduler::{DevicePoller, RefreshScheduler};
    use crate::store::{PrinterStore, StateStore};

    struct Unreachable;

    #[async_trait]
    impl DevicePoller for Unreachable {
        async fn poll(&self, _device: &Device) -> PollResult {
            PollResult::offline()
        }
    }

    fn app_state() -> AppState {
        let store: Arc<dyn PrinterStore> = Arc::new(StateStore::in_memory(Vec::new(), 15));
        let scheduler = Arc::new(RefreshScheduler::new(Arc::clone(&store), Arc::new(Unreachable), 1));
        AppState { store, scheduler }
    }

    async fn put(state: &AppState, interval_minutes: u64) -> Result<Json<Value>, ApiError> {
        set_refresh_interval(State(state.clone()), Json(RefreshInterval { interval_minutes })).await
    }

    #[tokio::test]
    async fn huge_interval_is_rejected_and_timer_keeps_running() {
        let state = app_state();
        state.scheduler.start().await;

        let err = put(&state, u64::MAX).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        let err = put(&state, 0).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        assert!(state.scheduler.is_running().await);
        assert_eq!(state.store.refresh_interval_minutes().await.unwrap(), 15);

        let Json(body) = put(&state, 30).await.unwrap();
        assert_eq!(body["interval_minutes"], 30);
        state.scheduler.stop().await;
    }
}
