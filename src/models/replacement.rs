use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::printer::DeviceId;

/// Кто записал замену
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementSource {
    Auto,
    Manual,
}

/// Запись истории замен. Только добавляется; удаляется лишь явным
/// действием администратора.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementEvent {
    pub id: u64,
    pub device_id: DeviceId,
    pub supply_name: String,
    pub level: i64,
    pub capacity: i64,
    pub source: ReplacementSource,
    #[serde(default)]
    pub remark: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Замена до присвоения идентификатора хранилищем
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReplacementEvent {
    pub device_id: DeviceId,
    pub supply_name: String,
    pub level: i64,
    pub capacity: i64,
    pub source: ReplacementSource,
    pub remark: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl NewReplacementEvent {
    pub fn with_id(self, id: u64) -> ReplacementEvent {
        ReplacementEvent {
            id,
            device_id: self.device_id,
            supply_name: self.supply_name,
            level: self.level,
            capacity: self.capacity,
            source: self.source,
            remark: self.remark,
            recorded_at: self.recorded_at,
        }
    }
}
