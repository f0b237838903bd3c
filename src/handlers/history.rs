use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiError, AppState, internal};
use crate::history::{self, ManualReplacement};
use crate::models::{DeviceId, ReplacementEvent};

pub async fn list_history(
    State(state): State<AppState>,
    Path(device_id): Path<DeviceId>,
) -> Result<Json<Vec<ReplacementEvent>>, ApiError> {
    if state.store.device(device_id).await.map_err(internal)?.is_none() {
        return Err((StatusCode::NOT_FOUND, format!("Устройство {} не найдено", device_id)));
    }
    let events = state.store.history(device_id).await.map_err(internal)?;
    Ok(Json(events))
}

/// Ручная запись о замене
pub async fn add_history(
    State(state): State<AppState>,
    Path(device_id): Path<DeviceId>,
    Json(request): Json<ManualReplacement>,
) -> Result<(StatusCode, Json<ReplacementEvent>), ApiError> {
    if request.supply_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Не указан расходник".to_string()));
    }
    if state.store.device(device_id).await.map_err(internal)?.is_none() {
        return Err((StatusCode::NOT_FOUND, format!("Устройство {} не найдено", device_id)));
    }

    let event = history::record_manual_replacement(state.store.as_ref(), device_id, request, chrono::Utc::now())
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn delete_history(State(state): State<AppState>, Path(event_id): Path<u64>) -> Result<StatusCode, ApiError> {
    if state.store.delete_history(event_id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Запись {} не найдена", event_id)))
    }
}
