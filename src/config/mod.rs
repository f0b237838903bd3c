use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

pub mod settings;

pub use settings::{HttpSettings, RefreshSettings, SnmpSettings, StorageSettings};

use crate::models::Device;

/// Интервал обновления по умолчанию (минуты)
pub const DEFAULT_REFRESH_MINUTES: u64 = 15;

/// Верхняя граница интервала обновления: неделя
pub const MAX_REFRESH_MINUTES: u64 = 7 * 24 * 60;

/// Проверка интервала обновления, общая для конфигурации, хранилища и API
pub fn check_refresh_minutes(minutes: u64) -> Result<()> {
    if !(1..=MAX_REFRESH_MINUTES).contains(&minutes) {
        anyhow::bail!(
            "Интервал обновления должен быть от 1 до {} минут, получено {}",
            MAX_REFRESH_MINUTES,
            minutes
        );
    }
    Ok(())
}

/// Путь к конфигурации, если `PRINTER_MONITOR_CONFIG` не задан
pub const DEFAULT_CONFIG_PATH: &str = "./config/printer-monitor.yaml";

/// Главная конфигурация приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub snmp: SnmpSettings,
    pub refresh: RefreshSettings,
    pub http: HttpSettings,
    pub storage: StorageSettings,
    /// Опрашиваемые принтеры
    pub printers: Vec<Device>,
}

impl AppConfig {
    /// Загружает конфигурацию по пути из окружения, применяет
    /// переопределения из переменных окружения и проверяет значения.
    pub fn load() -> Result<Self> {
        let path = env::var("PRINTER_MONITOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Читает YAML файл. Если файла нет, берутся значения по умолчанию.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .context(format!("Не удалось прочитать файл: {}", path.display()))?;

        Self::from_yaml(&content).context(format!("Ошибка в конфигурации {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content).context("Не удалось распарсить YAML")
    }

    /// Переопределения из окружения. `lookup` отдельно, чтобы тесты
    /// не трогали реальные переменные процесса.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(community) = lookup("SNMP_COMMUNITY") {
            self.snmp.community = community;
        }
        if let Some(timeout) = lookup("SNMP_TIMEOUT") {
            self.snmp.timeout_secs = timeout
                .trim()
                .parse()
                .context(format!("SNMP_TIMEOUT должен быть числом: {}", timeout))?;
        }
        if let Some(retries) = lookup("SNMP_RETRIES") {
            self.snmp.retries = retries
                .trim()
                .parse()
                .context(format!("SNMP_RETRIES должен быть числом: {}", retries))?;
        }
        if let Some(bind) = lookup("HTTP_BIND") {
            self.http.bind = bind;
        }
        if let Some(state_file) = lookup("STATE_FILE") {
            self.storage.state_file = Some(PathBuf::from(state_file));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.snmp.timeout_secs == 0 {
            anyhow::bail!("snmp.timeout_secs должен быть не меньше 1");
        }
        check_refresh_minutes(self.refresh.interval_minutes).context("refresh.interval_minutes")?;
        if self.refresh.max_parallel == 0 {
            anyhow::bail!("refresh.max_parallel должен быть не меньше 1");
        }

        let mut seen = HashSet::new();
        for printer in &self.printers {
            if !seen.insert(printer.id) {
                anyhow::bail!("Принтер с id {} указан дважды", printer.id);
            }
            if printer.address.trim().is_empty() {
                anyhow::bail!("У принтера {} не указан адрес", printer.id);
            }
        }
        Ok(())
    }
}
