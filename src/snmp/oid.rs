use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use snmp2::Oid;

/// Числовой OID без привязки к буферу транспорта.
///
/// Сравнение и сортировка идут покомпонентно, поэтому `...9.1.10` стоит
/// после `...9.1.2`, как и в порядке обхода агента.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OidPath(Vec<u64>);

impl OidPath {
    pub fn new(parts: Vec<u64>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &OidPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Компоненты после префикса, если OID лежит внутри поддерева.
    pub fn suffix_after(&self, prefix: &OidPath) -> Option<&[u64]> {
        self.0.strip_prefix(prefix.0.as_slice())
    }

    /// Конвертирует в OID транспорта snmp2.
    pub fn to_snmp(&self) -> Result<Oid<'static>> {
        Oid::from(&self.0).map_err(|e| anyhow::anyhow!("Не удалось создать Oid из '{}': {:?}", self, e))
    }

    pub fn from_snmp(oid: &Oid<'_>) -> Result<Self> {
        oid.to_string().parse()
    }
}

impl FromStr for OidPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Result<Vec<u64>, _> = s
            .trim()
            .split('.')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<u64>())
            .collect();

        let parts = parts.context(format!("Невалидный OID: {}", s))?;
        if parts.is_empty() {
            anyhow::bail!("Пустой OID: '{}'", s);
        }
        Ok(Self(parts))
    }
}

impl fmt::Display for OidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

/// Хорошо известные OID, которые опрашивает движок.
pub mod known {
    /// sysDescr.0, строка идентификации устройства
    pub const SYS_DESCR: &str = "1.3.6.1.2.1.1.1.0";
    /// hrPrinterDetectedErrorState.1, битовое поле ошибок (RFC 3805)
    pub const PRINTER_ERROR_STATE: &str = "1.3.6.1.2.1.25.3.5.1.2.1";
    /// prtMarkerSuppliesEntry
    pub const SUPPLIES_TABLE: &str = "1.3.6.1.2.1.43.11.1.1";
    /// Частная таблица тонера Ricoh
    pub const RICOH_TONER_TABLE: &str = "1.3.6.1.4.1.367.3.2.1.2.24.1.1";
}
