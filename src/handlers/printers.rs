use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use super::{ApiError, AppState, internal};
use crate::formatter::{JsonFormatter, PrinterReportJson};
use crate::scheduler::RefreshOutcome;

pub async fn list_printers(State(state): State<AppState>) -> Result<Json<Vec<PrinterReportJson>>, ApiError> {
    let devices = state.store.list_devices().await.map_err(internal)?;

    let mut reports = Vec::with_capacity(devices.len());
    for device in &devices {
        let status = state.store.status(device.id).await.map_err(internal)?;
        let supplies = state.store.supplies(device.id).await.map_err(internal)?;
        reports.push(JsonFormatter::printer_report(device, status.as_ref(), &supplies));
    }

    Ok(Json(reports))
}

/// «Обновить сейчас». Если цикл уже идёт, второй не запускается.
pub async fn refresh_printers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.scheduler.refresh_now().await.map_err(internal)?;

    Ok(match outcome {
        RefreshOutcome::Completed(summary) => (
            StatusCode::OK,
            Json(json!({
                "status": "completed",
                "devices": summary.devices,
                "online": summary.online,
                "offline": summary.offline,
                "replacements": summary.replacements,
                "failed": summary.failed,
            })),
        ),
        RefreshOutcome::AlreadyRunning => (StatusCode::ACCEPTED, Json(json!({ "status": "already_running" }))),
    })
}
