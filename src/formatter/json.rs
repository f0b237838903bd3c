use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::{PrinterStatus, Supply, SupplyCategory};
use crate::models::{Device, DeviceId, DeviceStatusRecord};

/// Порог, ниже которого расходник подсвечивается на дашборде
pub const LOW_SUPPLY_PERCENT: u8 = 10;

/// JSON структура принтера для дашборда
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterReportJson {
    pub id: DeviceId,
    pub name: String,
    pub address: String,
    pub online: bool,
    pub status: PrinterStatus,
    /// Время последнего опроса; None, если устройство ещё не опрашивалось
    pub updated_at: Option<String>,
    pub summary: SupplySummary,
    pub supplies: Vec<SupplyJson>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplySummary {
    pub total: usize,
    pub low: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyJson {
    pub name: String,
    pub level: i64,
    pub capacity: i64,
    pub percent: u8,
    pub category: SupplyCategory,
    pub state: String, // "ok" | "low" | "empty" | "unknown" | "present"
}

/// JSON форматтер для ответов API
pub struct JsonFormatter;

impl JsonFormatter {
    /// Собирает отчёт по одному принтеру из того, что лежит в хранилище
    pub fn printer_report(device: &Device, status: Option<&DeviceStatusRecord>, supplies: &[Supply]) -> PrinterReportJson {
        let supplies: Vec<SupplyJson> = supplies.iter().map(Self::format_supply).collect();

        let summary = SupplySummary {
            total: supplies.len(),
            low: supplies.iter().filter(|s| s.state == "low" || s.state == "empty").count(),
            unknown: supplies.iter().filter(|s| s.state == "unknown").count(),
        };

        PrinterReportJson {
            id: device.id,
            name: device.display_name().to_string(),
            address: device.address.clone(),
            online: status.is_some_and(|s| s.online),
            // ещё не опрошенное устройство показываем как недоступное
            status: status.map_or(PrinterStatus::Offline, |s| s.status),
            updated_at: status.map(|s| Self::timestamp(s.updated_at)),
            summary,
            supplies,
        }
    }

    fn format_supply(supply: &Supply) -> SupplyJson {
        let state = match supply {
            s if !s.usable => "unknown",
            s if s.binary && s.percent > 0 => "present",
            s if s.percent == 0 => "empty",
            s if s.percent <= LOW_SUPPLY_PERCENT => "low",
            _ => "ok",
        };

        SupplyJson {
            name: supply.name.clone(),
            level: supply.level,
            capacity: supply.capacity,
            percent: supply.percent,
            category: supply.category,
            state: state.to_string(),
        }
    }

    pub fn timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Device {
        Device {
            id: 3,
            name: String::new(),
            address: "10.1.1.3".into(),
            community: None,
        }
    }

    fn supply(name: &str, percent: u8, usable: bool, binary: bool) -> Supply {
        Supply {
            name: name.into(),
            level: percent as i64,
            capacity: 100,
            percent,
            category: SupplyCategory::Toner,
            usable,
            binary,
        }
    }

    #[test]
    fn never_polled_device_is_offline() {
        let report = JsonFormatter::printer_report(&device(), None, &[]);
        assert_eq!(report.name, "10.1.1.3");
        assert!(!report.online);
        assert_eq!(report.status, PrinterStatus::Offline);
        assert!(report.updated_at.is_none());
    }

    #[test]
    fn supply_states_and_summary() {
        let status = DeviceStatusRecord {
            device_id: 3,
            status: PrinterStatus::Running,
            online: true,
            updated_at: Utc::now(),
        };
        let supplies = [
            supply("Black", 45, true, false),
            supply("Cyan", 7, true, false),
            supply("Magenta", 0, true, false),
            supply("Drum", 0, false, false),
            supply("Cartridge 047", 100, true, true),
        ];
        let report = JsonFormatter::printer_report(&device(), Some(&status), &supplies);

        let states: Vec<&str> = report.supplies.iter().map(|s| s.state.as_str()).collect();
        assert_eq!(states, ["ok", "low", "empty", "unknown", "present"]);
        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.low, 2);
        assert_eq!(report.summary.unknown, 1);

        let json = serde_json::to_string_pretty(&[report]).unwrap();
        assert!(json.contains("\"status\": \"running\""));
        assert!(json.contains("\"category\": \"toner\""));
    }
}
