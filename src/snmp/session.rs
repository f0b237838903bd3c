use anyhow::Result;
use async_trait::async_trait;

use super::oid::OidPath;
use super::value::{Response, Varbind};

/// Один логический диалог с устройством на время цикла опроса.
///
/// Ошибка `Err` означает отказ транспорта (таймаут после всех повторов),
/// вызывающий обязан трактовать её как «устройство недоступно».
/// Ошибки отдельных OID приходят внутри `Ok` как [`Response::Error`].
#[async_trait]
pub trait SnmpSession: Send {
    /// GET по списку OID, ответы в том же порядке.
    async fn request(&mut self, oids: &[OidPath]) -> Result<Vec<Varbind>>;

    /// GETBULK начиная со `start` (не включая его).
    async fn get_bulk(&mut self, start: &OidPath, max_repetitions: u32) -> Result<Vec<Varbind>>;

    /// GET одного OID; `None`, если агент ответил ошибкой varbind.
    async fn get(&mut self, oid: &OidPath) -> Result<Option<Response>> {
        let mut varbinds = self.request(std::slice::from_ref(oid)).await?;
        if varbinds.is_empty() {
            return Ok(None);
        }
        Ok(Some(varbinds.swap_remove(0).response))
    }
}
