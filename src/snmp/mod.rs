use anyhow::Result;

pub mod device_profiles;
pub mod oid;
pub mod session;
pub mod v2c;
pub mod value;

pub use device_profiles::{DeviceDetector, DeviceInfo, VendorFamily};
pub use oid::{OidPath, known};
pub use session::SnmpSession;
pub use v2c::{SessionOptions, SnmpClientV2c};
pub use value::{Response, VarbindError, Varbind, WireValue};

/// Открывает SNMPv2c сессию к устройству.
///
/// Ошибка здесь возможна только на уровне сокета (разрешение адреса,
/// bind). Недоступность агента проявится на первом запросе.
pub async fn open_session(
    target: &str,
    community: &[u8],
    options: SessionOptions,
) -> Result<SnmpClientV2c> {
    SnmpClientV2c::new(target, community, options).await
}
