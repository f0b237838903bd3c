use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

pub mod replacement;

pub use replacement::{ReplacementDetector, fill_percent};

use crate::collector::{PollResult, SupplyLevel};
use crate::models::{Device, DeviceId, DeviceStatusRecord, NewReplacementEvent, ReplacementEvent, ReplacementSource};
use crate::store::PrinterStore;

/// Сохраняет результат опроса одного устройства.
///
/// Статус обновляется всегда. Снимок расходников перезаписывается только
/// если устройство на связи и что-то вернуло; до перезаписи читается
/// прежний снимок, и по нему решается, была ли замена. Возвращает
/// записанные события замены.
///
/// Вызывающий гарантирует, что для одного устройства одновременно идёт
/// не больше одной записи.
pub async fn record_poll(
    store: &dyn PrinterStore,
    device: &Device,
    result: &PollResult,
    now: DateTime<Utc>,
) -> Result<Vec<ReplacementEvent>> {
    store
        .upsert_status(DeviceStatusRecord {
            device_id: device.id,
            status: result.status,
            online: result.online,
            updated_at: now,
        })
        .await
        .context(format!("Не удалось сохранить статус устройства {}", device.id))?;

    if !result.online || result.supplies.is_empty() {
        return Ok(Vec::new());
    }

    let previous = store
        .current_snapshot(device.id)
        .await
        .context(format!("Не удалось прочитать снимок устройства {}", device.id))?;

    let events: Vec<NewReplacementEvent> = result
        .supplies
        .iter()
        .filter(|supply| ReplacementDetector::is_replacement(previous.get(&supply.name).copied(), supply.level()))
        .map(|supply| NewReplacementEvent {
            device_id: device.id,
            supply_name: supply.name.clone(),
            level: supply.level,
            capacity: supply.capacity,
            source: ReplacementSource::Auto,
            remark: None,
            recorded_at: now,
        })
        .collect();

    let written = store
        .replace_snapshot(device.id, &result.supplies, events)
        .await
        .context(format!("Не удалось сохранить снимок устройства {}", device.id))?;

    for event in &written {
        let old = previous.get(&event.supply_name).copied().map(fill_percent).unwrap_or_default();
        let new = fill_percent(SupplyLevel {
            level: event.level,
            capacity: event.capacity,
        });
        info!(
            device = device.display_name(),
            supply = %event.supply_name,
            old_percent = old.round(),
            new_percent = new.round(),
            "обнаружена замена расходника"
        );
    }

    Ok(written)
}

/// Ручная запись о замене от оператора
#[derive(Debug, Clone, Deserialize)]
pub struct ManualReplacement {
    pub supply_name: String,
    pub level: i64,
    pub capacity: i64,
    #[serde(default)]
    pub remark: Option<String>,
}

pub async fn record_manual_replacement(
    store: &dyn PrinterStore,
    device_id: DeviceId,
    request: ManualReplacement,
    now: DateTime<Utc>,
) -> Result<ReplacementEvent> {
    let supply_name = request.supply_name.trim();
    if supply_name.is_empty() {
        anyhow::bail!("Не указан расходник");
    }
    if store.device(device_id).await?.is_none() {
        anyhow::bail!("Устройство {} не найдено", device_id);
    }

    let remark = request.remark.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    store
        .append_history(NewReplacementEvent {
            device_id,
            supply_name: supply_name.to_string(),
            level: request.level,
            capacity: request.capacity,
            source: ReplacementSource::Manual,
            remark,
            recorded_at: now,
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{PrinterStatus, Supply, SupplyCategory};
    use crate::store::StateStore;

    fn device() -> Device {
        Device {
            id: 7,
            name: "Ricoh 1F".into(),
            address: "192.168.20.17".into(),
            community: None,
        }
    }

    fn supply(name: &str, level: i64, capacity: i64) -> Supply {
        Supply {
            name: name.into(),
            level,
            capacity,
            percent: 0,
            category: SupplyCategory::Toner,
            usable: true,
            binary: false,
        }
    }

    fn online(supplies: Vec<Supply>) -> PollResult {
        PollResult::online(PrinterStatus::Running, supplies)
    }

    #[tokio::test]
    async fn first_poll_records_no_history() {
        let store = StateStore::in_memory(vec![device()], 15);
        let events = record_poll(&store, &device(), &online(vec![supply("Black", 100, 100)]), Utc::now())
            .await
            .unwrap();
        assert!(events.is_empty());
        assert_eq!(store.supplies(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn jump_is_compared_with_previous_snapshot() {
        let store = StateStore::in_memory(vec![device()], 15);
        record_poll(&store, &device(), &online(vec![supply("Black", 5, 100), supply("Cyan", 60, 100)]), Utc::now())
            .await
            .unwrap();

        let events = record_poll(
            &store,
            &device(),
            &online(vec![supply("Black", 95, 100), supply("Cyan", 95, 100)]),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].supply_name, "Black");
        assert_eq!(events[0].source, ReplacementSource::Auto);
        assert_eq!((events[0].level, events[0].capacity), (95, 100));

        // тот же уровень в следующем цикле не даёт повторного события
        let again = record_poll(&store, &device(), &online(vec![supply("Black", 95, 100)]), Utc::now())
            .await
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(store.history(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn offline_keeps_snapshot_and_updates_status() {
        let store = StateStore::in_memory(vec![device()], 15);
        record_poll(&store, &device(), &online(vec![supply("Black", 40, 100)]), Utc::now())
            .await
            .unwrap();
        record_poll(&store, &device(), &PollResult::offline(), Utc::now()).await.unwrap();

        let status = store.status(7).await.unwrap().unwrap();
        assert!(!status.online);
        assert_eq!(status.status, PrinterStatus::Offline);
        assert_eq!(store.supplies(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn manual_replacement_is_validated() {
        let store = StateStore::in_memory(vec![device()], 15);
        let request = ManualReplacement {
            supply_name: " Black Toner ".into(),
            level: 100,
            capacity: 100,
            remark: Some("  ".into()),
        };
        let event = record_manual_replacement(&store, 7, request.clone(), Utc::now()).await.unwrap();
        assert_eq!(event.source, ReplacementSource::Manual);
        assert_eq!(event.supply_name, "Black Toner");
        assert_eq!(event.remark, None);

        assert!(record_manual_replacement(&store, 99, request.clone(), Utc::now()).await.is_err());
        let unnamed = ManualReplacement {
            supply_name: "".into(),
            ..request
        };
        assert!(record_manual_replacement(&store, 7, unnamed, Utc::now()).await.is_err());
    }
}
