use tracing::warn;

use super::types::TableResult;
use crate::snmp::{OidPath, Response, SnmpSession, VarbindError};

/// Размер пачки GETBULK по умолчанию
pub const DEFAULT_MAX_REPETITIONS: u32 = 20;

/// Обход поддерева MIB
pub struct TableCollector;

impl TableCollector {
    /// Обходит все OID под `prefix` по порядку, не больше `max_rows` записей.
    ///
    /// Ошибка транспорта посреди обхода не теряет уже собранные строки:
    /// они возвращаются вместе с `error`. Агент, который отвечает
    /// неубывающими OID, останавливается той же ошибкой.
    pub async fn walk<S: SnmpSession + ?Sized>(
        session: &mut S,
        name: &str,
        prefix: &OidPath,
        max_rows: usize,
        max_repetitions: u32,
    ) -> TableResult {
        let mut result = TableResult {
            name: name.to_string(),
            oid: prefix.clone(),
            rows: Vec::new(),
            error: None,
            limited_to: None,
        };
        let mut current = prefix.clone();

        'walk: loop {
            let batch = match session.get_bulk(&current, max_repetitions.max(1)).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(table = name, collected = result.rows.len(), error = %e, "обход таблицы прерван");
                    result.error = Some(format!("SNMP ERROR: {:#}", e));
                    break;
                }
            };

            if batch.is_empty() {
                break;
            }

            for varbind in batch {
                if matches!(varbind.response, Response::Error(VarbindError::EndOfMibView))
                    || !varbind.oid.starts_with(prefix)
                {
                    break 'walk;
                }
                if varbind.oid <= current {
                    warn!(table = name, oid = %varbind.oid, "агент вернул неубывающий OID");
                    result.error = Some(format!("OID не возрастает: {}", varbind.oid));
                    break 'walk;
                }
                if result.rows.len() >= max_rows {
                    result.limited_to = Some(max_rows);
                    break 'walk;
                }

                current = varbind.oid.clone();
                result.rows.push(varbind);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::snmp::{Varbind, WireValue};

    /// Агент-заглушка: упорядоченное дерево OID и опциональный сбой
    /// после заданного числа GETBULK.
    struct TreeAgent {
        tree: BTreeMap<OidPath, WireValue>,
        fail_after: Option<usize>,
        calls: usize,
    }

    impl TreeAgent {
        fn new(entries: &[(&str, WireValue)]) -> Self {
            Self {
                tree: entries
                    .iter()
                    .map(|(oid, v)| (oid.parse().unwrap(), v.clone()))
                    .collect(),
                fail_after: None,
                calls: 0,
            }
        }
    }

    #[async_trait]
    impl SnmpSession for TreeAgent {
        async fn request(&mut self, oids: &[OidPath]) -> Result<Vec<Varbind>> {
            Ok(oids
                .iter()
                .map(|oid| match self.tree.get(oid) {
                    Some(v) => Varbind::new(oid.clone(), Response::Value(v.clone())),
                    None => Varbind::new(oid.clone(), Response::Error(VarbindError::NoSuchObject)),
                })
                .collect())
        }

        async fn get_bulk(&mut self, start: &OidPath, max_repetitions: u32) -> Result<Vec<Varbind>> {
            if self.fail_after.is_some_and(|n| self.calls >= n) {
                anyhow::bail!("timeout");
            }
            self.calls += 1;
            let mut out: Vec<Varbind> = self
                .tree
                .range((std::ops::Bound::Excluded(start.clone()), std::ops::Bound::Unbounded))
                .take(max_repetitions as usize)
                .map(|(oid, v)| Varbind::new(oid.clone(), Response::Value(v.clone())))
                .collect();
            if out.len() < max_repetitions as usize {
                let last = out.last().map(|vb| vb.oid.clone()).unwrap_or_else(|| start.clone());
                out.push(Varbind::new(last, Response::Error(VarbindError::EndOfMibView)));
            }
            Ok(out)
        }
    }

    fn supplies_agent() -> TreeAgent {
        TreeAgent::new(&[
            ("1.3.6.1.2.1.43.11.1.1.6.1.1", WireValue::text("Black Toner")),
            ("1.3.6.1.2.1.43.11.1.1.6.1.2", WireValue::text("Waste Toner Box")),
            ("1.3.6.1.2.1.43.11.1.1.8.1.1", WireValue::Integer(100)),
            ("1.3.6.1.2.1.43.11.1.1.8.1.2", WireValue::Integer(0)),
            ("1.3.6.1.2.1.43.11.1.1.9.1.1", WireValue::Integer(45)),
            ("1.3.6.1.2.1.43.11.1.1.9.1.2", WireValue::Integer(0)),
            ("1.3.6.1.2.1.43.12.1.1.4.1.1", WireValue::text("outside")),
        ])
    }

    fn prefix() -> OidPath {
        "1.3.6.1.2.1.43.11.1.1".parse().unwrap()
    }

    #[tokio::test]
    async fn walks_until_subtree_ends() {
        let mut agent = supplies_agent();
        let table = TableCollector::walk(&mut agent, "supplies", &prefix(), 100, 4).await;

        assert!(table.is_complete());
        assert_eq!(table.rows.len(), 6);
        assert!(table.rows.iter().all(|vb| vb.oid.starts_with(&prefix())));
    }

    #[tokio::test]
    async fn stops_at_row_limit() {
        let mut agent = supplies_agent();
        let table = TableCollector::walk(&mut agent, "supplies", &prefix(), 3, 2).await;

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.limited_to, Some(3));
        assert!(table.error.is_none());
    }

    #[tokio::test]
    async fn keeps_partial_rows_on_transport_error() {
        let mut agent = supplies_agent();
        agent.fail_after = Some(1);
        let table = TableCollector::walk(&mut agent, "supplies", &prefix(), 100, 2).await;

        assert_eq!(table.rows.len(), 2);
        assert!(table.error.is_some());
    }

    struct LoopingAgent;

    #[async_trait]
    impl SnmpSession for LoopingAgent {
        async fn request(&mut self, _oids: &[OidPath]) -> Result<Vec<Varbind>> {
            Ok(Vec::new())
        }

        async fn get_bulk(&mut self, _start: &OidPath, _max: u32) -> Result<Vec<Varbind>> {
            let oid: OidPath = "1.3.6.1.2.1.43.11.1.1.6.1.1".parse().unwrap();
            Ok(vec![Varbind::new(oid, Response::Value(WireValue::text("again")))])
        }
    }

    #[tokio::test]
    async fn detects_looping_agent() {
        let table = TableCollector::walk(&mut LoopingAgent, "supplies", &prefix(), 1000, 10).await;

        assert_eq!(table.rows.len(), 1);
        assert!(table.error.as_deref().unwrap().contains("не возрастает"));
    }
}
