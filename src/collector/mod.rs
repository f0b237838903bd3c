use std::net::{IpAddr, SocketAddr};

use tracing::{debug, warn};

pub mod normalizer;
pub mod rows;
pub mod status;
pub mod strategy;
pub mod table_collector;
pub mod types;

pub use normalizer::{NormalizeRules, SupplyNormalizer};
pub use status::{DecodedStatus, StatusDecoder, TonerFlags};
pub use strategy::{SupplyContext, SupplyStrategy, WalkLimits, select_strategy};
pub use table_collector::TableCollector;
pub use types::{PollResult, PrinterStatus, Supply, SupplyCategory, SupplyLevel, TableResult};

use crate::snmp::{self, DeviceDetector, OidPath, SessionOptions, SnmpSession, WireValue, known};

/// Параметры опроса одного устройства
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub port: u16,
    pub session: SessionOptions,
    pub limits: WalkLimits,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            port: 161,
            session: SessionOptions::default(),
            limits: WalkLimits::default(),
        }
    }
}

/// Оркестратор цикла опроса:
/// подключение → статус → расходники → (частная таблица) → результат.
///
/// Всегда возвращает результат; недоступным устройство считается только
/// по провалу первой проверки связи.
pub struct SnmpCollector;

impl SnmpCollector {
    /// Открывает сессию и опрашивает устройство.
    pub async fn poll_device(address: &str, community: &str, settings: &PollSettings) -> PollResult {
        let target = target_address(address, settings.port);

        let mut session =
            match snmp::open_session(&target, community.as_bytes(), settings.session.clone()).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(address, error = %format!("{:#}", e), "не удалось открыть SNMP сессию");
                    return PollResult::offline();
                }
            };

        Self::poll(&mut session, address, settings.limits).await
        // сессия закрывается здесь, при drop
    }

    /// Опрос по уже открытой сессии.
    pub async fn poll(session: &mut dyn SnmpSession, address: &str, limits: WalkLimits) -> PollResult {
        let Some(identity) = Self::identify(session, address).await else {
            return PollResult::offline();
        };

        let device = DeviceDetector::detect(&identity);
        debug!(address, vendor = device.vendor.as_str(), identity = %device.description, "устройство на связи");

        let decoded = Self::check_status(session, address).await;

        let strategy = select_strategy(&device);
        let ctx = SupplyContext {
            address,
            flags: decoded.flags,
            limits,
        };
        let supplies = strategy.collect(session, &ctx).await;
        debug!(address, strategy = strategy.name(), supplies = supplies.len(), status = %decoded.status, "опрос завершён");

        PollResult::online(decoded.status, supplies)
    }

    /// Проверка связи: sysDescr. Ошибка или пустое значение означают offline.
    async fn identify(session: &mut dyn SnmpSession, address: &str) -> Option<String> {
        let oid: OidPath = known::SYS_DESCR.parse().ok()?;
        match session.get(&oid).await {
            Ok(Some(response)) => {
                let identity = response.value().map(WireValue::as_text).unwrap_or_default();
                if identity.trim().is_empty() {
                    warn!(address, "устройство вернуло пустой sysDescr");
                    None
                } else {
                    Some(identity)
                }
            }
            Ok(None) => {
                warn!(address, "пустой ответ на проверку связи");
                None
            }
            Err(e) => {
                warn!(address, error = %format!("{:#}", e), "устройство недоступно");
                None
            }
        }
    }

    /// Статус best-effort: любая ошибка даёт `running`.
    async fn check_status(session: &mut dyn SnmpSession, address: &str) -> DecodedStatus {
        let Ok(oid) = known::PRINTER_ERROR_STATE.parse::<OidPath>() else {
            return DecodedStatus::default();
        };
        match session.get(&oid).await {
            Ok(response) => StatusDecoder::decode(response.as_ref()),
            Err(e) => {
                debug!(address, error = %format!("{:#}", e), "не удалось прочитать состояние ошибок");
                DecodedStatus::default()
            }
        }
    }
}

/// Адрес агента: порт по умолчанию добавляется, если не указан.
pub fn target_address(address: &str, default_port: u16) -> String {
    let address = address.trim();
    if address.parse::<SocketAddr>().is_ok() {
        return address.to_string();
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return SocketAddr::new(ip, default_port).to_string();
    }
    if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, default_port)
    }
}
