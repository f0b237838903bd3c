use async_trait::async_trait;
use tracing::{info, warn};

use super::normalizer::{NormalizeRules, SENTINEL_SOME_REMAINING, SENTINEL_UNKNOWN, SupplyNormalizer};
use super::rows::{self, RawRow};
use super::status::TonerFlags;
use super::table_collector::TableCollector;
use super::types::Supply;
use crate::snmp::{DeviceInfo, OidPath, SnmpSession, VendorFamily, known};

/// Лимиты обхода таблиц
#[derive(Debug, Clone, Copy)]
pub struct WalkLimits {
    pub max_rows: usize,
    pub max_repetitions: u32,
}

impl Default for WalkLimits {
    fn default() -> Self {
        Self {
            max_rows: 256,
            max_repetitions: super::table_collector::DEFAULT_MAX_REPETITIONS,
        }
    }
}

/// Что известно стратегии к моменту обхода расходников
#[derive(Debug, Clone, Copy)]
pub struct SupplyContext<'a> {
    pub address: &'a str,
    pub flags: TonerFlags,
    pub limits: WalkLimits,
}

/// Контракт «обойти → нормализовать» для одного семейства устройств
#[async_trait]
pub trait SupplyStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, device: &DeviceInfo) -> bool;

    async fn collect(&self, session: &mut dyn SnmpSession, ctx: &SupplyContext<'_>) -> Vec<Supply>;
}

static STRATEGIES: &[&dyn SupplyStrategy] = &[&RicohStrategy, &CanonLbpStrategy, &StandardStrategy];

/// Первая подходящая стратегия; стандартная подходит всегда.
pub fn select_strategy(device: &DeviceInfo) -> &'static dyn SupplyStrategy {
    STRATEGIES
        .iter()
        .copied()
        .find(|s| s.matches(device))
        .unwrap_or(&StandardStrategy)
}

/// Обход стандартной таблицы prtMarkerSupplies. Ошибки обхода только
/// логируются: дальше идут те строки, что успели собраться.
async fn walk_standard(session: &mut dyn SnmpSession, ctx: &SupplyContext<'_>) -> Vec<RawRow> {
    walk_table(session, ctx, "prtMarkerSuppliesTable", known::SUPPLIES_TABLE, rows::supply_rows).await
}

async fn walk_table<R>(
    session: &mut dyn SnmpSession,
    ctx: &SupplyContext<'_>,
    name: &str,
    prefix: &str,
    assemble: fn(&OidPath, &[crate::snmp::Varbind]) -> Vec<R>,
) -> Vec<R> {
    let prefix: OidPath = match prefix.parse() {
        Ok(prefix) => prefix,
        Err(e) => {
            warn!(table = name, error = %e, "некорректный OID таблицы");
            return Vec::new();
        }
    };

    let table = TableCollector::walk(
        session,
        name,
        &prefix,
        ctx.limits.max_rows,
        ctx.limits.max_repetitions,
    )
    .await;

    if let Some(error) = &table.error {
        warn!(address = ctx.address, table = name, rows = table.rows.len(), error = %error, "частичный обход таблицы");
    }
    if let Some(limit) = table.limited_to {
        warn!(address = ctx.address, table = name, limit, "обход таблицы остановлен по лимиту строк");
    }

    assemble(&prefix, &table.rows)
}

/// Printer MIB как есть
pub struct StandardStrategy;

#[async_trait]
impl SupplyStrategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn matches(&self, _device: &DeviceInfo) -> bool {
        true
    }

    async fn collect(&self, session: &mut dyn SnmpSession, ctx: &SupplyContext<'_>) -> Vec<Supply> {
        let rows = walk_standard(session, ctx).await;
        SupplyNormalizer::normalize(&rows, NormalizeRules::default(), ctx.flags)
    }
}

/// Canon LBP не знает уровня тонера: -2/-3 превращаются в «есть/нет»
/// по флагу noToner.
pub struct CanonLbpStrategy;

#[async_trait]
impl SupplyStrategy for CanonLbpStrategy {
    fn name(&self) -> &'static str {
        "canon-lbp"
    }

    fn matches(&self, device: &DeviceInfo) -> bool {
        device.vendor == VendorFamily::CanonLbp
    }

    async fn collect(&self, session: &mut dyn SnmpSession, ctx: &SupplyContext<'_>) -> Vec<Supply> {
        let rows = walk_standard(session, ctx).await;
        let rules = NormalizeRules {
            sentinel_as_binary: true,
            numbered_cartridges: true,
        };
        SupplyNormalizer::normalize(&rows, rules, ctx.flags)
    }
}

/// Ricoh: если стандартная таблица отдаёт маркеры, её строки
/// заменяются строками частной таблицы тонера.
pub struct RicohStrategy;

impl RicohStrategy {
    pub fn standard_table_unusable(rows: &[RawRow]) -> bool {
        rows.iter()
            .any(|r| r.level == Some(SENTINEL_SOME_REMAINING) || r.capacity == Some(SENTINEL_UNKNOWN))
    }
}

#[async_trait]
impl SupplyStrategy for RicohStrategy {
    fn name(&self) -> &'static str {
        "ricoh"
    }

    fn matches(&self, device: &DeviceInfo) -> bool {
        device.vendor == VendorFamily::Ricoh
    }

    async fn collect(&self, session: &mut dyn SnmpSession, ctx: &SupplyContext<'_>) -> Vec<Supply> {
        let rows = walk_standard(session, ctx).await;
        if !Self::standard_table_unusable(&rows) {
            return SupplyNormalizer::normalize(&rows, NormalizeRules::default(), ctx.flags);
        }

        info!(address = ctx.address, "стандартная таблица Ricoh без уровней, читаю частную таблицу");
        let vendor_rows = walk_table(
            session,
            ctx,
            "ricohTonerTable",
            known::RICOH_TONER_TABLE,
            rows::ricoh_rows,
        )
        .await;
        SupplyNormalizer::normalize_vendor(&vendor_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::DeviceDetector;

    #[test]
    fn picks_strategy_by_identity() {
        assert_eq!(select_strategy(&DeviceDetector::detect("RICOH MP C3004")).name(), "ricoh");
        assert_eq!(select_strategy(&DeviceDetector::detect("Canon LBP6030")).name(), "canon-lbp");
        assert_eq!(select_strategy(&DeviceDetector::detect("Brother HL-L2350DW")).name(), "standard");
    }

    #[test]
    fn ricoh_quirk_detection() {
        let ok = vec![RawRow {
            description: Some("Black Toner".into()),
            level: Some(40),
            capacity: Some(100),
        }];
        let broken = vec![RawRow {
            description: Some("Black Toner".into()),
            level: Some(-3),
            capacity: Some(-2),
        }];
        assert!(!RicohStrategy::standard_table_unusable(&ok));
        assert!(RicohStrategy::standard_table_unusable(&broken));
    }
}
