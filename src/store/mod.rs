use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

pub mod state;

pub use state::StateStore;

use crate::collector::{Supply, SupplyLevel};
use crate::models::{Device, DeviceId, DeviceStatusRecord, NewReplacementEvent, ReplacementEvent};

/// Граница между движком опроса и хранилищем.
///
/// Каждая операция атомарна в пределах одного устройства.
#[async_trait]
pub trait PrinterStore: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>>;

    async fn device(&self, device_id: DeviceId) -> Result<Option<Device>>;

    /// Текущий снимок: имя расходника → (level, capacity)
    async fn current_snapshot(&self, device_id: DeviceId) -> Result<HashMap<String, SupplyLevel>>;

    /// Полностью заменяет снимок устройства и в той же записи добавляет
    /// события замены. При ошибке прежнее состояние не меняется.
    async fn replace_snapshot(
        &self,
        device_id: DeviceId,
        supplies: &[Supply],
        events: Vec<NewReplacementEvent>,
    ) -> Result<Vec<ReplacementEvent>>;

    async fn append_history(&self, event: NewReplacementEvent) -> Result<ReplacementEvent>;

    async fn upsert_status(&self, record: DeviceStatusRecord) -> Result<()>;

    async fn refresh_interval_minutes(&self) -> Result<u64>;

    async fn set_refresh_interval_minutes(&self, minutes: u64) -> Result<()>;

    /// Расходники последнего успешного опроса, в порядке таблицы
    async fn supplies(&self, device_id: DeviceId) -> Result<Vec<Supply>>;

    async fn status(&self, device_id: DeviceId) -> Result<Option<DeviceStatusRecord>>;

    /// История замен, новые первыми
    async fn history(&self, device_id: DeviceId) -> Result<Vec<ReplacementEvent>>;

    /// Удаляет одну запись истории; false, если её не было
    async fn delete_history(&self, event_id: u64) -> Result<bool>;
}
