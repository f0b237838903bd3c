use super::rows::{RawRow, VendorRow};
use super::status::TonerFlags;
use super::types::{Supply, SupplyCategory};

/// Значения-маркеры prtMarkerSuppliesLevel / MaxCapacity (RFC 3805)
pub const SENTINEL_UNKNOWN: i64 = -2;
pub const SENTINEL_SOME_REMAINING: i64 = -3;

/// Процент, который показываем для «что-то осталось, сколько неизвестно»
const SOME_REMAINING_PERCENT: i64 = 25;

const WASTE_KEYWORDS: &[&str] = &["waste", "disposal", "废"];
const TONER_KEYWORDS: &[&str] = &[
    "toner", "cartridge", "black", "cyan", "magenta", "yellow", "碳粉", "墨", "黑色", "青色", "品红色",
    "黄色",
];
/// Признаки картриджа младших моделей без датчика уровня
const BINARY_CARTRIDGE_MARKERS: &[&str] = &["canon", "lbp", "crg"];

/// Правила, которые выбирает стратегия производителя
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeRules {
    /// Строки с уровнем -2/-3 считать картриджами «есть/нет»
    pub sentinel_as_binary: bool,
    /// «Cartridge 325» без упоминания модели тоже картридж «есть/нет»
    pub numbered_cartridges: bool,
}

/// Сводит сырые строки таблицы к каноническому списку расходников.
///
/// Чистая функция от входа: нет состояния между вызовами, порядок
/// результата повторяет порядок строк.
pub struct SupplyNormalizer;

impl SupplyNormalizer {
    pub fn normalize(rows: &[RawRow], rules: NormalizeRules, flags: TonerFlags) -> Vec<Supply> {
        let supplies = rows
            .iter()
            .filter_map(|row| Self::normalize_row(row, rules, flags))
            .collect();
        Self::retain_meaningful(supplies)
    }

    /// Строки частной таблицы уже содержат процент: level = percent, capacity = 100.
    pub fn normalize_vendor(rows: &[VendorRow]) -> Vec<Supply> {
        let supplies = rows
            .iter()
            .filter_map(|row| {
                let percent = clamp_percent(row.percent?);
                let name = [&row.description, &row.name]
                    .into_iter()
                    .flatten()
                    .map(|s| s.trim())
                    .find(|s| !s.is_empty())
                    .unwrap_or("Unknown Toner")
                    .to_string();
                let category = match Self::classify(&name) {
                    SupplyCategory::Waste => SupplyCategory::Waste,
                    _ => SupplyCategory::Toner,
                };

                Some(Supply {
                    name,
                    level: i64::from(percent),
                    capacity: 100,
                    percent,
                    category,
                    usable: true,
                    binary: false,
                })
            })
            .collect();
        Self::retain_meaningful(supplies)
    }

    fn normalize_row(row: &RawRow, rules: NormalizeRules, flags: TonerFlags) -> Option<Supply> {
        let name = row.description.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let level = row.level?;
        let capacity = row.capacity?;
        let category = Self::classify(name);

        let binary = Self::is_binary_cartridge(name)
            || (rules.numbered_cartridges && Self::is_numbered_cartridge(name))
            || (rules.sentinel_as_binary && matches!(level, SENTINEL_UNKNOWN | SENTINEL_SOME_REMAINING));

        if binary {
            let full = if flags.no_toner { 0 } else { 100 };
            return Some(Supply {
                name: name.to_string(),
                level: full,
                capacity: if capacity <= 0 { 100 } else { capacity },
                percent: clamp_percent(full),
                category,
                usable: true,
                binary: true,
            });
        }

        let (percent, usable) = Self::percent_of(level, capacity);
        Some(Supply {
            name: name.to_string(),
            level,
            capacity,
            percent,
            category,
            usable,
            binary: false,
        })
    }

    /// Процент заполнения по стандартным правилам маркеров.
    ///
    /// Второе значение false, если сочетание не распознано.
    pub fn percent_of(level: i64, capacity: i64) -> (u8, bool) {
        let (raw, usable) = if level == SENTINEL_SOME_REMAINING {
            (SOME_REMAINING_PERCENT, true)
        } else if level == SENTINEL_UNKNOWN || capacity == SENTINEL_UNKNOWN {
            (0, true)
        } else if capacity > 0 && level >= 0 {
            ((level as f64 / capacity as f64 * 100.0).round() as i64, true)
        } else if capacity <= 0 && level > 0 && level <= 100 {
            (level, true)
        } else {
            (0, false)
        };
        (clamp_percent(raw), usable)
    }

    /// Категория по описанию, без учёта регистра. Отходы проверяются первыми:
    /// «Waste Toner Box» это контейнер, а не тонер.
    pub fn classify(description: &str) -> SupplyCategory {
        let lower = description.to_lowercase();
        if WASTE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            SupplyCategory::Waste
        } else if TONER_KEYWORDS.iter().any(|k| lower.contains(k)) {
            SupplyCategory::Toner
        } else {
            SupplyCategory::Other
        }
    }

    /// «Canon Cartridge 325», «Black Cartridge for LBP2900» и подобные.
    pub fn is_binary_cartridge(description: &str) -> bool {
        let lower = description.to_lowercase();
        lower.contains("cartridge") && BINARY_CARTRIDGE_MARKERS.iter().any(|m| lower.contains(m))
    }

    /// Номер сразу после «cartridge»: «Cartridge 303». Так картриджи
    /// называет только Canon, у остальных это обычный тонер с уровнем.
    pub fn is_numbered_cartridge(description: &str) -> bool {
        description
            .to_lowercase()
            .split("cartridge")
            .skip(1)
            .any(|rest| rest.trim_start().starts_with(|c: char| c.is_ascii_digit()))
    }

    /// Убирает пустые строки-заглушки. Контейнеры отходов и картриджи
    /// «есть/нет» остаются даже пустыми.
    fn retain_meaningful(mut supplies: Vec<Supply>) -> Vec<Supply> {
        supplies.retain(|s| {
            s.level > 0
                || s.capacity > 0
                || s.percent > 0
                || s.category == SupplyCategory::Waste
                || s.binary
        });
        supplies
    }
}

fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(desc: &str, level: i64, capacity: i64) -> RawRow {
        RawRow {
            description: Some(desc.to_string()),
            level: Some(level),
            capacity: Some(capacity),
        }
    }

    fn generic(rows: &[RawRow]) -> Vec<Supply> {
        SupplyNormalizer::normalize(rows, NormalizeRules::default(), TonerFlags::default())
    }

    #[test]
    fn black_toner_and_empty_waste_box() {
        let supplies = generic(&[row("Black Toner", 45, 100), row("Waste Toner Box", 0, 0)]);

        assert_eq!(supplies.len(), 2);
        assert_eq!(supplies[0].name, "Black Toner");
        assert_eq!(supplies[0].percent, 45);
        assert_eq!(supplies[0].category, SupplyCategory::Toner);
        assert_eq!(supplies[1].name, "Waste Toner Box");
        assert_eq!(supplies[1].percent, 0);
        assert_eq!(supplies[1].category, SupplyCategory::Waste);
    }

    #[test]
    fn sentinels() {
        assert_eq!(SupplyNormalizer::percent_of(-3, 100), (25, true));
        assert_eq!(SupplyNormalizer::percent_of(-3, -2), (25, true));
        assert_eq!(SupplyNormalizer::percent_of(-2, 100), (0, true));
        assert_eq!(SupplyNormalizer::percent_of(50, -2), (0, true));
        assert_eq!(SupplyNormalizer::percent_of(80, -1), (80, true));
        assert_eq!(SupplyNormalizer::percent_of(-1, -1), (0, false));
        assert_eq!(SupplyNormalizer::percent_of(0, 0), (0, false));
        assert_eq!(SupplyNormalizer::percent_of(250, 0), (0, false));
    }

    #[test]
    fn ratio_is_rounded_and_clamped() {
        assert_eq!(SupplyNormalizer::percent_of(1, 3), (33, true));
        assert_eq!(SupplyNormalizer::percent_of(2, 3), (67, true));
        assert_eq!(SupplyNormalizer::percent_of(7500, 5000), (100, true));
    }

    #[test]
    fn percent_always_in_range() {
        let values = [i64::MIN, -100, -3, -2, -1, 0, 1, 50, 99, 100, 101, 5000, i64::MAX];
        for &level in &values {
            for &capacity in &values {
                let (percent, _) = SupplyNormalizer::percent_of(level, capacity);
                assert!(percent <= 100, "level={level} capacity={capacity}");
            }
        }
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let rows = vec![
            RawRow {
                description: Some("Cyan Toner".into()),
                level: Some(10),
                capacity: None,
            },
            RawRow {
                description: None,
                level: Some(10),
                capacity: Some(100),
            },
            row("   ", 10, 100),
        ];
        assert!(generic(&rows).is_empty());
    }

    #[test]
    fn retention_keeps_waste_and_drops_blank_other() {
        let supplies = generic(&[row("Waste Container", 0, 0), row("Fuser Unit", 0, 0)]);
        assert_eq!(supplies.len(), 1);
        assert_eq!(supplies[0].category, SupplyCategory::Waste);
    }

    #[test]
    fn unrecognized_combination_is_kept_as_unusable() {
        let supplies = generic(&[row("Drum Unit", -1, 200)]);
        assert_eq!(supplies.len(), 1);
        assert_eq!(supplies[0].percent, 0);
        assert!(!supplies[0].usable);
    }

    #[test]
    fn binary_cartridge_driven_by_no_toner_flag() {
        let rows = [row("Canon Cartridge 325", 37, -2)];

        let empty = SupplyNormalizer::normalize(
            &rows,
            NormalizeRules::default(),
            TonerFlags {
                no_toner: true,
                low_toner: false,
            },
        );
        assert_eq!(empty.len(), 1);
        assert_eq!((empty[0].level, empty[0].capacity, empty[0].percent), (0, 100, 0));
        assert!(empty[0].binary);

        let full = generic(&rows);
        assert_eq!((full[0].level, full[0].capacity, full[0].percent), (100, 100, 100));
    }

    #[test]
    fn sentinel_rows_are_binary_under_canon_rules() {
        let rules = NormalizeRules {
            sentinel_as_binary: true,
            ..Default::default()
        };
        let supplies = SupplyNormalizer::normalize(&[row("Black Toner", -3, -2)], rules, TonerFlags::default());
        assert_eq!(supplies[0].percent, 100);
        assert!(supplies[0].binary);

        let plain = generic(&[row("Black Toner", -3, -2)]);
        assert_eq!(plain[0].percent, 25);
        assert!(!plain[0].binary);
    }

    #[test]
    fn classifies_descriptions() {
        assert_eq!(SupplyNormalizer::classify("WASTE TONER BOTTLE"), SupplyCategory::Waste);
        assert_eq!(SupplyNormalizer::classify("Toner Disposal Unit"), SupplyCategory::Waste);
        assert_eq!(SupplyNormalizer::classify("Magenta Cartridge HP CF403A"), SupplyCategory::Toner);
        assert_eq!(SupplyNormalizer::classify("黑色碳粉"), SupplyCategory::Toner);
        assert_eq!(SupplyNormalizer::classify("Imaging Drum"), SupplyCategory::Other);
    }

    #[test]
    fn binary_cartridge_pattern() {
        assert!(SupplyNormalizer::is_binary_cartridge("Canon Cartridge 303"));
        assert!(SupplyNormalizer::is_binary_cartridge("Black Cartridge for LBP2900"));
        assert!(!SupplyNormalizer::is_binary_cartridge("Cartridge 303"));
        assert!(!SupplyNormalizer::is_binary_cartridge("Black Cartridge HP CF226A"));
        assert!(!SupplyNormalizer::is_binary_cartridge("Canon GPR-53 Black Toner"));

        assert!(SupplyNormalizer::is_numbered_cartridge("Cartridge 303"));
        assert!(SupplyNormalizer::is_numbered_cartridge("Toner Cartridge 12A"));
        assert!(!SupplyNormalizer::is_numbered_cartridge("Black Cartridge HP CF226A"));
    }

    #[test]
    fn numbered_cartridge_keeps_real_level_outside_canon() {
        let rows = [row("Toner Cartridge 12A", 1300, 2600)];

        let plain = generic(&rows);
        assert_eq!(plain.len(), 1);
        assert_eq!((plain[0].level, plain[0].capacity, plain[0].percent), (1300, 2600, 50));
        assert!(!plain[0].binary);

        let canon = NormalizeRules {
            sentinel_as_binary: true,
            numbered_cartridges: true,
        };
        let supplies = SupplyNormalizer::normalize(&rows, canon, TonerFlags::default());
        assert_eq!(supplies[0].percent, 100);
        assert!(supplies[0].binary);
    }

    #[test]
    fn vendor_rows_map_directly() {
        let rows = vec![
            VendorRow {
                name: Some("K".into()),
                description: Some("Toner Black".into()),
                percent: Some(70),
            },
            VendorRow {
                name: Some("Waste".into()),
                description: None,
                percent: Some(-100),
            },
            VendorRow {
                name: Some("C".into()),
                description: Some("Toner Cyan".into()),
                percent: None,
            },
        ];
        let supplies = SupplyNormalizer::normalize_vendor(&rows);

        assert_eq!(supplies.len(), 2);
        assert_eq!((supplies[0].level, supplies[0].capacity, supplies[0].percent), (70, 100, 70));
        assert_eq!(supplies[0].category, SupplyCategory::Toner);
        assert_eq!(supplies[1].name, "Waste");
        assert_eq!(supplies[1].percent, 0);
        assert_eq!(supplies[1].category, SupplyCategory::Waste);
    }

    #[test]
    fn normalization_is_idempotent() {
        let rows = vec![row("Black Toner", -3, -2), row("Cyan Toner", 120, 400), row("Waste", 0, 0)];
        assert_eq!(generic(&rows), generic(&rows));
    }
}
