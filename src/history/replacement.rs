use crate::collector::SupplyLevel;

/// Минимальный скачок процента, чтобы считать его заменой
pub const MIN_JUMP_PERCENT: f64 = 40.0;
/// Новый уровень должен быть почти полным
pub const MIN_NEW_PERCENT: f64 = 90.0;
/// Старый уровень не должен быть полным
pub const MAX_OLD_PERCENT: f64 = 100.0;

/// Процент заполнения для сравнения; без ёмкости считается нулём.
pub fn fill_percent(level: SupplyLevel) -> f64 {
    if level.capacity > 0 {
        level.level as f64 / level.capacity as f64 * 100.0
    } else {
        0.0
    }
}

/// Детектор замен по скачку процента.
///
/// Не отличает реальную замену картриджа от сброса счётчика прошивкой:
/// срабатывает на любой скачок, проходящий все три порога.
pub struct ReplacementDetector;

impl ReplacementDetector {
    /// `previous` это значение из хранилища до перезаписи текущим опросом.
    /// Первое наблюдение (нет предыдущего) никогда не считается заменой.
    pub fn is_replacement(previous: Option<SupplyLevel>, current: SupplyLevel) -> bool {
        let Some(previous) = previous else {
            return false;
        };
        let old = fill_percent(previous);
        let new = fill_percent(current);

        new - old > MIN_JUMP_PERCENT && new >= MIN_NEW_PERCENT && old < MAX_OLD_PERCENT
    }
}
