use serde::Serialize;

/// Семейство устройств, у которого есть известные отклонения от Printer MIB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VendorFamily {
    /// Ricoh: стандартная таблица расходников часто отдаёт -3/-2
    Ricoh,
    /// Canon LBP: младшие лазерные модели без датчика уровня тонера
    CanonLbp,
    Generic,
}

/// Информация об устройстве
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub vendor: VendorFamily,
    pub description: String,
}

/// Детектор типа устройства
pub struct DeviceDetector;

impl DeviceDetector {
    /// Определяет семейство по sysDescr (без учёта регистра)
    pub fn detect(sys_descr: &str) -> DeviceInfo {
        let lower = sys_descr.to_lowercase();

        let vendor = if lower.contains("ricoh") {
            VendorFamily::Ricoh
        } else if lower.contains("canon") && (lower.contains("lbp") || lower.contains("laser")) {
            VendorFamily::CanonLbp
        } else {
            VendorFamily::Generic
        };

        DeviceInfo {
            vendor,
            description: sys_descr.trim().to_string(),
        }
    }
}

impl VendorFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorFamily::Ricoh => "ricoh",
            VendorFamily::CanonLbp => "canon-lbp",
            VendorFamily::Generic => "generic",
        }
    }
}
