use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use snmp2::{AsyncSession, Oid, Pdu};
use tokio::time::timeout;
use tracing::debug;

use super::oid::OidPath;
use super::session::SnmpSession;
use super::value::{Response, Varbind};

/// Параметры открытия сессии.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retries: 2,
        }
    }
}

/// SNMPv2c клиент поверх `snmp2::AsyncSession`.
///
/// Сокет принадлежит клиенту и закрывается при drop, на любом пути выхода.
pub struct SnmpClientV2c {
    /// В куче: внутри сессии буфер приёма на 64 КиБ
    session: Box<AsyncSession>,
    target: String,
    options: SessionOptions,
}

impl SnmpClientV2c {
    pub async fn new(target: &str, community: &[u8], options: SessionOptions) -> Result<Self> {
        let session = Box::pin(AsyncSession::new_v2c(target, community, 2))
            .await
            .map(Box::new)
            .context(format!("Не удалось создать SNMP сессию с {}", target))?;

        Ok(Self {
            session,
            target: target.to_string(),
            options,
        })
    }

    async fn get_one(&mut self, oid: &Oid<'_>) -> Result<Vec<Varbind>> {
        let mut attempt = 0;
        loop {
            match timeout(self.options.timeout, self.session.get(oid)).await {
                Ok(Ok(pdu)) => return Ok(collect_varbinds(pdu)),
                Ok(Err(e)) if attempt >= self.options.retries => {
                    return Err(anyhow::anyhow!("SNMP GET запрос не удался: {:?}", e));
                }
                Err(_) if attempt >= self.options.retries => {
                    anyhow::bail!(
                        "Таймаут SNMP GET к {} после {} повторов",
                        self.target,
                        self.options.retries
                    );
                }
                Ok(Err(e)) => debug!(address = %self.target, attempt, error = ?e, "повтор SNMP GET"),
                Err(_) => debug!(address = %self.target, attempt, "таймаут SNMP GET, повтор"),
            }
            attempt += 1;
        }
    }

    async fn getbulk_one(&mut self, oid: &Oid<'_>, max_repetitions: u32) -> Result<Vec<Varbind>> {
        let mut attempt = 0;
        loop {
            match timeout(self.options.timeout, self.session.getbulk(&[oid], 0, max_repetitions)).await {
                Ok(Ok(pdu)) => return Ok(collect_varbinds(pdu)),
                Ok(Err(e)) if attempt >= self.options.retries => {
                    return Err(anyhow::anyhow!("SNMP GETBULK запрос не удался: {:?}", e));
                }
                Err(_) if attempt >= self.options.retries => {
                    anyhow::bail!(
                        "Таймаут SNMP GETBULK к {} после {} повторов",
                        self.target,
                        self.options.retries
                    );
                }
                Ok(Err(e)) => debug!(address = %self.target, attempt, error = ?e, "повтор SNMP GETBULK"),
                Err(_) => debug!(address = %self.target, attempt, "таймаут SNMP GETBULK, повтор"),
            }
            attempt += 1;
        }
    }
}

fn collect_varbinds(pdu: Pdu<'_>) -> Vec<Varbind> {
    pdu.varbinds
        .into_iter()
        .filter_map(|(oid, value)| {
            // OID из ответа агента всегда числовой; непарсящийся пропускаем
            let oid = OidPath::from_snmp(&oid).ok()?;
            Some(Varbind::new(oid, Response::from_snmp(value)))
        })
        .collect()
}

#[async_trait]
impl SnmpSession for SnmpClientV2c {
    async fn request(&mut self, oids: &[OidPath]) -> Result<Vec<Varbind>> {
        let mut results = Vec::with_capacity(oids.len());
        // Некоторые HP отвечают ошибкой на GET из нескольких OID, поэтому по одному
        for oid in oids {
            let snmp_oid = oid.to_snmp()?;
            results.extend(self.get_one(&snmp_oid).await?);
        }
        Ok(results)
    }

    async fn get_bulk(&mut self, start: &OidPath, max_repetitions: u32) -> Result<Vec<Varbind>> {
        let snmp_oid = start.to_snmp()?;
        self.getbulk_one(&snmp_oid, max_repetitions).await
    }
}
