use serde::{Deserialize, Serialize};

use crate::snmp::{OidPath, Varbind};

/// Результат обхода таблицы
#[derive(Debug, Clone)]
pub struct TableResult {
    pub name: String,
    pub oid: OidPath,
    pub rows: Vec<Varbind>,
    pub error: Option<String>,
    /// Заполнено, если обход остановлен по лимиту строк
    pub limited_to: Option<usize>,
}

impl TableResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.limited_to.is_none()
    }
}

/// Категория расходника
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplyCategory {
    Toner,
    Waste,
    Other,
}

/// Нормализованный расходник
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub name: String,
    /// Может быть отрицательным значением-маркером из MIB
    pub level: i64,
    pub capacity: i64,
    /// Всегда в диапазоне 0..=100
    pub percent: u8,
    pub category: SupplyCategory,
    /// false, если сочетание level/capacity не распознано и percent принудительно 0
    pub usable: bool,
    /// Картридж без датчика: есть / закончился
    pub binary: bool,
}

/// Пара (level, capacity), которую сравнивает детектор замен
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyLevel {
    pub level: i64,
    pub capacity: i64,
}

impl Supply {
    pub fn level(&self) -> SupplyLevel {
        SupplyLevel {
            level: self.level,
            capacity: self.capacity,
        }
    }
}

/// Грубый статус устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterStatus {
    #[serde(rename = "jammed")]
    Jammed,
    #[serde(rename = "no-paper")]
    NoPaper,
    #[serde(rename = "door-open")]
    DoorOpen,
    #[serde(rename = "no-toner")]
    NoToner,
    #[serde(rename = "service-required")]
    ServiceRequired,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "Offline")]
    Offline,
}

impl PrinterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterStatus::Jammed => "jammed",
            PrinterStatus::NoPaper => "no-paper",
            PrinterStatus::DoorOpen => "door-open",
            PrinterStatus::NoToner => "no-toner",
            PrinterStatus::ServiceRequired => "service-required",
            PrinterStatus::Running => "running",
            PrinterStatus::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Результат одного цикла опроса устройства
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollResult {
    pub online: bool,
    pub status: PrinterStatus,
    pub supplies: Vec<Supply>,
}

impl PollResult {
    /// Единственное допустимое сочетание полей для недоступного устройства
    pub fn offline() -> Self {
        Self {
            online: false,
            status: PrinterStatus::Offline,
            supplies: Vec::new(),
        }
    }

    pub fn online(status: PrinterStatus, supplies: Vec<Supply>) -> Self {
        Self {
            online: true,
            status,
            supplies,
        }
    }
}
