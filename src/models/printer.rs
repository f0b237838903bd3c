use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::PrinterStatus;

pub type DeviceId = u64;

/// Принтер, который опрашивает движок. Создаётся и меняется снаружи,
/// движок его только читает.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: String,
    /// IP или host[:port]
    pub address: String,
    /// SNMP community; если не задано, берётся из настроек
    #[serde(default)]
    pub community: Option<String>,
}

impl Device {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.address } else { &self.name }
    }
}

/// Последний известный статус устройства, одна запись на устройство
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatusRecord {
    pub device_id: DeviceId,
    pub status: PrinterStatus,
    pub online: bool,
    pub updated_at: DateTime<Utc>,
}
