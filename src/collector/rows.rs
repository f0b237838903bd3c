use std::collections::BTreeMap;

use crate::snmp::{OidPath, Varbind, WireValue};

/// Индекс строки таблицы: компоненты OID после номера колонки.
pub type RowIndex = Vec<u64>;

/// Группирует записи обхода по индексу строки.
///
/// OID внутри таблицы имеет вид `<prefix>.<column>.<row-index...>`;
/// записи без индекса или с ошибкой varbind пропускаются. Порядок строк
/// повторяет порядок индексов, так что результат не зависит от порядка
/// ответов агента.
pub fn group_rows(prefix: &OidPath, entries: &[Varbind]) -> BTreeMap<RowIndex, BTreeMap<u64, WireValue>> {
    let mut rows: BTreeMap<RowIndex, BTreeMap<u64, WireValue>> = BTreeMap::new();

    for entry in entries {
        let Some(value) = entry.response.value() else {
            continue;
        };
        let Some(suffix) = entry.oid.suffix_after(prefix) else {
            continue;
        };
        let [column, index @ ..] = suffix else {
            continue;
        };
        if index.is_empty() {
            continue;
        }

        rows.entry(index.to_vec())
            .or_default()
            .insert(*column, value.clone());
    }

    rows
}

/// Строка стандартной таблицы prtMarkerSupplies, собранная за один обход.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub description: Option<String>,
    pub capacity: Option<i64>,
    pub level: Option<i64>,
}

/// Колонки prtMarkerSuppliesEntry
const COL_DESCRIPTION: u64 = 6;
const COL_MAX_CAPACITY: u64 = 8;
const COL_LEVEL: u64 = 9;

/// Строки стандартной таблицы расходников в порядке индексов.
pub fn supply_rows(prefix: &OidPath, entries: &[Varbind]) -> Vec<RawRow> {
    group_rows(prefix, entries)
        .into_values()
        .map(|columns| RawRow {
            description: columns.get(&COL_DESCRIPTION).map(WireValue::as_text),
            capacity: columns.get(&COL_MAX_CAPACITY).and_then(WireValue::as_integer),
            level: columns.get(&COL_LEVEL).and_then(WireValue::as_integer),
        })
        .collect()
}

/// Строка частной таблицы тонера Ricoh: уже готовый процент.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub percent: Option<i64>,
}

const RICOH_COL_NAME: u64 = 2;
const RICOH_COL_DESCRIPTION: u64 = 3;
const RICOH_COL_PERCENT: u64 = 5;

pub fn ricoh_rows(prefix: &OidPath, entries: &[Varbind]) -> Vec<VendorRow> {
    group_rows(prefix, entries)
        .into_values()
        .map(|columns| VendorRow {
            name: columns.get(&RICOH_COL_NAME).map(WireValue::as_text),
            description: columns.get(&RICOH_COL_DESCRIPTION).map(WireValue::as_text),
            percent: columns.get(&RICOH_COL_PERCENT).and_then(WireValue::as_integer),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::{Response, VarbindError, known};

    fn vb(oid: &str, value: WireValue) -> Varbind {
        Varbind::new(oid.parse().unwrap(), Response::Value(value))
    }

    #[test]
    fn groups_columns_by_multi_segment_index() {
        let prefix: OidPath = known::SUPPLIES_TABLE.parse().unwrap();
        let entries = vec![
            vb("1.3.6.1.2.1.43.11.1.1.6.1.2", WireValue::text("Cyan Toner")),
            vb("1.3.6.1.2.1.43.11.1.1.6.1.1", WireValue::text("Black Toner")),
            vb("1.3.6.1.2.1.43.11.1.1.8.1.1", WireValue::Integer(100)),
            vb("1.3.6.1.2.1.43.11.1.1.9.1.1", WireValue::text("45")),
            vb("1.3.6.1.2.1.43.11.1.1.9.1.2", WireValue::Integer(-3)),
            Varbind::new(
                "1.3.6.1.2.1.43.11.1.1.8.1.2".parse().unwrap(),
                Response::Error(VarbindError::NoSuchInstance),
            ),
        ];

        let rows = supply_rows(&prefix, &entries);
        assert_eq!(
            rows,
            vec![
                RawRow {
                    description: Some("Black Toner".into()),
                    capacity: Some(100),
                    level: Some(45),
                },
                RawRow {
                    description: Some("Cyan Toner".into()),
                    capacity: None,
                    level: Some(-3),
                },
            ]
        );
    }

    #[test]
    fn ignores_entries_without_row_index() {
        let prefix: OidPath = known::SUPPLIES_TABLE.parse().unwrap();
        let entries = vec![vb("1.3.6.1.2.1.43.11.1.1.6", WireValue::text("column only"))];
        assert!(group_rows(&prefix, &entries).is_empty());
    }

    #[test]
    fn maps_ricoh_columns() {
        let prefix: OidPath = known::RICOH_TONER_TABLE.parse().unwrap();
        let entries = vec![
            vb("1.3.6.1.4.1.367.3.2.1.2.24.1.1.2.1", WireValue::text("K")),
            vb("1.3.6.1.4.1.367.3.2.1.2.24.1.1.3.1", WireValue::text("Toner Black")),
            vb("1.3.6.1.4.1.367.3.2.1.2.24.1.1.5.1", WireValue::Integer(70)),
        ];
        assert_eq!(
            ricoh_rows(&prefix, &entries),
            vec![VendorRow {
                name: Some("K".into()),
                description: Some("Toner Black".into()),
                percent: Some(70),
            }]
        );
    }
}
