use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Semaphore, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::collector::{PollResult, PollSettings, SnmpCollector};
use crate::config::{DEFAULT_REFRESH_MINUTES, SnmpSettings, check_refresh_minutes};
use crate::history;
use crate::models::Device;
use crate::store::PrinterStore;

/// Опрос одного устройства. Отдельный трейт, чтобы цикл обновления
/// можно было гонять без сети.
#[async_trait]
pub trait DevicePoller: Send + Sync {
    async fn poll(&self, device: &Device) -> PollResult;
}

/// Боевой опросчик поверх SNMP
pub struct SnmpPoller {
    community: String,
    settings: PollSettings,
}

impl SnmpPoller {
    pub fn new(settings: &SnmpSettings) -> Self {
        Self {
            community: settings.community.clone(),
            settings: settings.poll_settings(),
        }
    }

    /// Community принтера, если задано, иначе общее из настроек
    pub fn community_for<'a>(&'a self, device: &'a Device) -> &'a str {
        device.community.as_deref().unwrap_or(&self.community)
    }
}

#[async_trait]
impl DevicePoller for SnmpPoller {
    async fn poll(&self, device: &Device) -> PollResult {
        SnmpCollector::poll_device(&device.address, self.community_for(device), &self.settings).await
    }
}

/// Итоги одного цикла обновления
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub devices: usize,
    pub online: usize,
    pub offline: usize,
    pub replacements: usize,
    /// Устройства, чей цикл сорвался на сохранении или панике
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(CycleSummary),
    /// Цикл уже шёл; новый запуск слит с ним
    AlreadyRunning,
}

struct DeviceReport {
    online: bool,
    replacements: usize,
}

/// То, что нужно и таймеру, и ручному запуску
struct CycleRunner {
    store: Arc<dyn PrinterStore>,
    poller: Arc<dyn DevicePoller>,
    max_parallel: usize,
    cycle: Mutex<()>,
}

impl CycleRunner {
    /// Не больше одного цикла одновременно: если цикл уже идёт,
    /// новый запуск не ждёт и не стартует второй.
    async fn run_coalesced(&self, trigger: &'static str) -> Result<RefreshOutcome> {
        let Ok(_guard) = self.cycle.try_lock() else {
            info!(trigger, "цикл опроса уже идёт, запуск пропущен");
            return Ok(RefreshOutcome::AlreadyRunning);
        };
        self.run_cycle(trigger).await.map(RefreshOutcome::Completed)
    }

    async fn run_cycle(&self, trigger: &'static str) -> Result<CycleSummary> {
        let devices = self
            .store
            .list_devices()
            .await
            .context("Не удалось получить список устройств")?;

        let started = Instant::now();
        info!(trigger, devices = devices.len(), "цикл опроса начат");

        let permits = Arc::new(Semaphore::new(self.max_parallel.max(1)));
        let mut tasks = JoinSet::new();
        for device in devices.iter().cloned() {
            let permits = Arc::clone(&permits);
            let store = Arc::clone(&self.store);
            let poller = Arc::clone(&self.poller);
            tasks.spawn(async move {
                let report = async {
                    let _permit = permits.acquire_owned().await.context("Семафор опроса закрыт")?;
                    let result = poller.poll(&device).await;
                    let events = history::record_poll(store.as_ref(), &device, &result, Utc::now()).await?;
                    Ok::<_, anyhow::Error>(DeviceReport {
                        online: result.online,
                        replacements: events.len(),
                    })
                }
                .await;
                (device, report)
            });
        }

        let mut summary = CycleSummary {
            devices: devices.len(),
            ..Default::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(report))) => {
                    if report.online {
                        summary.online += 1;
                    } else {
                        summary.offline += 1;
                    }
                    summary.replacements += report.replacements;
                }
                Ok((device, Err(e))) => {
                    summary.failed += 1;
                    error!(device = device.display_name(), error = %format!("{:#}", e), "не удалось сохранить результат опроса");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(error = %e, "задача опроса устройства аварийно завершилась");
                }
            }
        }

        info!(
            trigger,
            devices = summary.devices,
            online = summary.online,
            offline = summary.offline,
            replacements = summary.replacements,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "цикл опроса завершён"
        );
        Ok(summary)
    }
}

struct Timer {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    interval_minutes: u64,
}

/// Планировщик периодического обновления.
///
/// Держит не больше одного таймера. `restart` под одной блокировкой
/// сначала полностью останавливает старый таймер, потом заводит новый.
pub struct RefreshScheduler {
    runner: Arc<CycleRunner>,
    timer: Mutex<Option<Timer>>,
}

impl RefreshScheduler {
    pub fn new(store: Arc<dyn PrinterStore>, poller: Arc<dyn DevicePoller>, max_parallel: usize) -> Self {
        Self {
            runner: Arc::new(CycleRunner {
                store,
                poller,
                max_parallel,
                cycle: Mutex::new(()),
            }),
            timer: Mutex::new(None),
        }
    }

    /// Запускает таймер, если он ещё не запущен. Первый цикл идёт сразу.
    /// Возвращает интервал в минутах.
    pub async fn start(&self) -> u64 {
        let mut timer = self.timer.lock().await;
        if let Some(running) = timer.as_ref() {
            return running.interval_minutes;
        }
        let started = self.spawn_timer().await;
        let minutes = started.interval_minutes;
        *timer = Some(started);
        minutes
    }

    /// Останавливает таймер. Идущий цикл не прерывается: метод ждёт
    /// его завершения.
    pub async fn stop(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(running) = timer.take() {
            Self::shutdown(running).await;
            info!("автообновление остановлено");
        }
    }

    /// Перечитывает интервал из хранилища и пересоздаёт таймер.
    pub async fn restart(&self) -> u64 {
        let mut timer = self.timer.lock().await;
        if let Some(running) = timer.take() {
            Self::shutdown(running).await;
        }
        let started = self.spawn_timer().await;
        let minutes = started.interval_minutes;
        *timer = Some(started);
        info!(interval_minutes = minutes, "автообновление перезапущено");
        minutes
    }

    pub async fn is_running(&self) -> bool {
        self.timer.lock().await.is_some()
    }

    /// Ручной запуск «обновить сейчас», сливается с идущим циклом
    pub async fn refresh_now(&self) -> Result<RefreshOutcome> {
        self.runner.run_coalesced("manual").await
    }

    async fn spawn_timer(&self) -> Timer {
        let interval_minutes = match self.runner.store.refresh_interval_minutes().await {
            Ok(minutes) if check_refresh_minutes(minutes).is_ok() => minutes,
            Ok(minutes) => {
                warn!(minutes, "интервал вне допустимых границ, используется значение по умолчанию");
                DEFAULT_REFRESH_MINUTES
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "интервал не прочитан, используется значение по умолчанию");
                DEFAULT_REFRESH_MINUTES
            }
        };

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let runner = Arc::clone(&self.runner);
        let period = Duration::from_secs(interval_minutes.saturating_mul(60));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = runner.run_coalesced("timer").await {
                            error!(error = %format!("{:#}", e), "цикл опроса не выполнен");
                        }
                    }
                }
            }
        });

        info!(interval_minutes, "автообновление запущено");
        Timer {
            shutdown,
            handle,
            interval_minutes,
        }
    }

    async fn shutdown(timer: Timer) {
        let _ = timer.shutdown.send(());
        if let Err(e) = timer.handle.await {
            error!(error = %e, "таймер автообновления завершился аварийно");
        }
    }
}
