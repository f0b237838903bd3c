use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::PrinterStore;
use crate::collector::{Supply, SupplyLevel};
use crate::models::{Device, DeviceId, DeviceStatusRecord, NewReplacementEvent, ReplacementEvent};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    devices: Vec<Device>,
    #[serde(default)]
    snapshots: BTreeMap<DeviceId, Vec<Supply>>,
    #[serde(default)]
    statuses: BTreeMap<DeviceId, DeviceStatusRecord>,
    #[serde(default)]
    history: Vec<ReplacementEvent>,
    #[serde(default)]
    next_history_id: u64,
    #[serde(default)]
    refresh_interval_minutes: Option<u64>,
}

/// Хранилище в памяти с опциональным зеркалом в JSON файл.
///
/// Запись применяется к копии состояния, копия сохраняется на диск
/// (временный файл + rename) и только потом подменяет текущее состояние.
/// Писатели идут строго по одному; читатели видят последнее
/// зафиксированное состояние и не ждут диска.
pub struct StateStore {
    state: Mutex<StoreState>,
    writer: tokio::sync::Mutex<()>,
    path: Option<PathBuf>,
}

impl StateStore {
    /// Хранилище только в памяти
    pub fn in_memory(devices: Vec<Device>, refresh_interval_minutes: u64) -> Self {
        Self {
            state: Mutex::new(StoreState {
                devices,
                refresh_interval_minutes: Some(refresh_interval_minutes),
                ..Default::default()
            }),
            writer: tokio::sync::Mutex::new(()),
            path: None,
        }
    }

    /// Открывает файл состояния (или начинает с пустого).
    ///
    /// Список устройств всегда берётся из конфигурации; интервал из файла
    /// имеет приоритет, если его меняли во время работы.
    pub fn open(path: impl AsRef<Path>, devices: Vec<Device>, refresh_interval_minutes: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .context(format!("Не удалось прочитать файл состояния: {}", path.display()))?;
            let state: StoreState = serde_json::from_str(&content)
                .context(format!("Не удалось распарсить файл состояния: {}", path.display()))?;
            info!(path = %path.display(), history = state.history.len(), "состояние загружено");
            state
        } else {
            StoreState::default()
        };

        let known: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
        state.snapshots.retain(|id, _| known.contains(id));
        state.statuses.retain(|id, _| known.contains(id));
        state.devices = devices;
        state.refresh_interval_minutes.get_or_insert(refresh_interval_minutes);

        persist(&path, &state)?;

        Ok(Self {
            state: Mutex::new(state),
            writer: tokio::sync::Mutex::new(()),
            path: Some(path),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("Состояние хранилища недоступно: мьютекс отравлен"))
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> Result<T> {
        let guard = self.lock()?;
        Ok(f(&guard))
    }

    async fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let _writer = self.writer.lock().await;

        let (mut next, out) = {
            let guard = self.lock()?;
            let mut next = guard.clone();
            let out = f(&mut next)?;
            (next, out)
        };

        // сериализация и запись на диск вне рабочих потоков runtime
        if let Some(path) = &self.path {
            let path = path.clone();
            next = tokio::task::spawn_blocking(move || persist(&path, &next).map(|_| next))
                .await
                .context("Задача записи состояния прервана")??;
        }

        *self.lock()? = next;
        Ok(out)
    }
}

fn persist(path: &Path, state: &StoreState) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).context(format!("Не удалось создать каталог {}", dir.display()))?;
    }
    let tmp = path.with_extension("tmp");
    let content = serde_json::to_vec(state).context("Ошибка сериализации состояния в JSON")?;

    let mut file = std::fs::File::create(&tmp).context(format!("Не удалось создать {}", tmp.display()))?;
    file.write_all(&content)
        .context(format!("Не удалось записать {}", tmp.display()))?;
    // данные на диске до rename, иначе после сбоя можно получить пустой файл
    file.sync_all()
        .context(format!("Не удалось сбросить {} на диск", tmp.display()))?;
    drop(file);

    std::fs::rename(&tmp, path).context(format!("Не удалось заменить {}", path.display()))?;
    debug!(path = %path.display(), "состояние сохранено");
    Ok(())
}

#[async_trait]
impl PrinterStore for StateStore {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        self.read(|s| s.devices.clone())
    }

    async fn device(&self, device_id: DeviceId) -> Result<Option<Device>> {
        self.read(|s| s.devices.iter().find(|d| d.id == device_id).cloned())
    }

    async fn current_snapshot(&self, device_id: DeviceId) -> Result<HashMap<String, SupplyLevel>> {
        self.read(|s| {
            s.snapshots
                .get(&device_id)
                .map(|supplies| supplies.iter().map(|x| (x.name.clone(), x.level())).collect())
                .unwrap_or_default()
        })
    }

    async fn replace_snapshot(
        &self,
        device_id: DeviceId,
        supplies: &[Supply],
        events: Vec<NewReplacementEvent>,
    ) -> Result<Vec<ReplacementEvent>> {
        self.write(|s| {
            // Уникальность по имени: при дубликатах в ответе агента побеждает последний
            let mut unique: Vec<Supply> = Vec::with_capacity(supplies.len());
            for supply in supplies {
                match unique.iter_mut().find(|u| u.name == supply.name) {
                    Some(existing) => *existing = supply.clone(),
                    None => unique.push(supply.clone()),
                }
            }
            s.snapshots.insert(device_id, unique);

            let mut written = Vec::with_capacity(events.len());
            for event in events {
                s.next_history_id += 1;
                let event = event.with_id(s.next_history_id);
                s.history.push(event.clone());
                written.push(event);
            }
            Ok(written)
        })
        .await
    }

    async fn append_history(&self, event: NewReplacementEvent) -> Result<ReplacementEvent> {
        self.write(|s| {
            s.next_history_id += 1;
            let event = event.with_id(s.next_history_id);
            s.history.push(event.clone());
            Ok(event)
        })
        .await
    }

    async fn upsert_status(&self, record: DeviceStatusRecord) -> Result<()> {
        self.write(|s| {
            s.statuses.insert(record.device_id, record);
            Ok(())
        })
        .await
    }

    async fn refresh_interval_minutes(&self) -> Result<u64> {
        self.read(|s| s.refresh_interval_minutes.unwrap_or(crate::config::DEFAULT_REFRESH_MINUTES))
    }

    async fn set_refresh_interval_minutes(&self, minutes: u64) -> Result<()> {
        crate::config::check_refresh_minutes(minutes)?;
        self.write(|s| {
            s.refresh_interval_minutes = Some(minutes);
            Ok(())
        })
        .await
    }

    async fn supplies(&self, device_id: DeviceId) -> Result<Vec<Supply>> {
        self.read(|s| s.snapshots.get(&device_id).cloned().unwrap_or_default())
    }

    async fn status(&self, device_id: DeviceId) -> Result<Option<DeviceStatusRecord>> {
        self.read(|s| s.statuses.get(&device_id).cloned())
    }

    async fn history(&self, device_id: DeviceId) -> Result<Vec<ReplacementEvent>> {
        self.read(|s| {
            let mut events: Vec<ReplacementEvent> =
                s.history.iter().filter(|e| e.device_id == device_id).cloned().collect();
            events.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));
            events
        })
    }

    async fn delete_history(&self, event_id: u64) -> Result<bool> {
        self.write(|s| {
            let before = s.history.len();
            s.history.retain(|e| e.id != event_id);
            Ok(s.history.len() != before)
        })
        .await
    }
}
