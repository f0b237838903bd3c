use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::DEFAULT_REFRESH_MINUTES;
use crate::collector::{PollSettings, WalkLimits};
use crate::snmp::SessionOptions;

/// Настройки SNMP опроса
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpSettings {
    /// Community по умолчанию, если у принтера своё не задано
    pub community: String,
    /// Порт агента, если в адресе порт не указан
    pub port: u16,
    /// Таймаут одного SNMP запроса (секунды)
    pub timeout_secs: u64,
    /// Количество повторов после таймаута
    pub retries: u32,
    /// Максимум строк, собираемых с одной таблицы
    pub max_walk_rows: usize,
    /// max-repetitions для GETBULK
    pub max_repetitions: u32,
}

impl Default for SnmpSettings {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
            port: 161,
            timeout_secs: 5,
            retries: 2,
            max_walk_rows: 256,
            max_repetitions: 20,
        }
    }
}

impl SnmpSettings {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            port: self.port,
            session: SessionOptions {
                timeout: Duration::from_secs(self.timeout_secs),
                retries: self.retries,
            },
            limits: WalkLimits {
                max_rows: self.max_walk_rows,
                max_repetitions: self.max_repetitions,
            },
        }
    }
}

/// Настройки планировщика обновления
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Начальный интервал; дальше значение живёт в хранилище
    pub interval_minutes: u64,
    /// Сколько устройств опрашивается одновременно
    pub max_parallel: usize,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_REFRESH_MINUTES,
            max_parallel: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON файл состояния; без него всё живёт только в памяти
    pub state_file: Option<PathBuf>,
}
