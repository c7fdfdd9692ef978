use crate::domain::model::{Catalog, ExtraItem, ItemKind, RecordTotals, SalesRecord};
use std::collections::BTreeMap;

pub const EMPTY_SUMMARY: &str = "— (수량 없음)";

pub fn total_quantity(counts: &BTreeMap<String, u32>) -> u32 {
    saturating_sum(counts.values().copied())
}

// 讀回的數量沒有上限，合計停在 u32::MAX
fn saturating_sum(quantities: impl IntoIterator<Item = u32>) -> u32 {
    quantities.into_iter().fold(0, u32::saturating_add)
}

impl RecordTotals {
    pub fn compute(
        chargers: &BTreeMap<String, u32>,
        ancillaries: &BTreeMap<String, u32>,
        extras: &[ExtraItem],
    ) -> Self {
        Self {
            chargers_total: total_quantity(chargers),
            ancillaries_total: total_quantity(ancillaries),
            extras_total: saturating_sum(extras.iter().map(|e| e.qty)),
        }
    }
}

/// 充電樁/附帶工程/其他型號的數量摘要，例如 `2100A x 2, I형 볼라드 x 1  | 총 3개`
pub fn quantity_summary(
    catalog: &Catalog,
    chargers: &BTreeMap<String, u32>,
    ancillaries: &BTreeMap<String, u32>,
    extras: &[ExtraItem],
) -> String {
    let mut parts = Vec::new();
    let mut total = 0u32;

    for (kind, counts) in [(ItemKind::Charger, chargers), (ItemKind::Ancillary, ancillaries)] {
        for name in catalog.items(kind) {
            let qty = counts.get(name).copied().unwrap_or(0);
            if qty > 0 {
                parts.push(format!("{} x {}", name, qty));
                total = total.saturating_add(qty);
            }
        }
    }
    for extra in extras {
        parts.push(format!("{} x {}", extra.name, extra.qty));
        total = total.saturating_add(extra.qty);
    }

    if parts.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }
    format!("{}  | 총 {}개", parts.join(", "), total)
}

pub fn record_summary(catalog: &Catalog, record: &SalesRecord) -> String {
    quantity_summary(
        catalog,
        &record.chargers,
        &record.ancillaries,
        &record.extras,
    )
}

/// 型錄中每個品項在所有報告中的數量合計，依名稱排序
pub fn catalog_totals(
    catalog: &Catalog,
    kind: ItemKind,
    records: &[SalesRecord],
) -> Vec<(String, u32)> {
    let mut sums = catalog.empty_counts(kind);
    for record in records {
        let counts = match kind {
            ItemKind::Charger => &record.chargers,
            ItemKind::Ancillary => &record.ancillaries,
        };
        for (name, qty) in counts {
            if let Some(sum) = sums.get_mut(name) {
                *sum = sum.saturating_add(*qty);
            }
        }
    }
    sums.into_iter().collect()
}

/// 清單顯示用的一行
pub fn list_line(record: &SalesRecord) -> String {
    format!(
        "{} | {} | {} | {}",
        record.date, record.site_name, record.salesperson, record.status
    )
}

/// 日期/現場/營業員/狀態的不分大小寫子字串比對
pub fn matches_query(record: &SalesRecord, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {} {}",
        record.date, record.site_name, record.salesperson, record.status
    )
    .to_lowercase();
    haystack.contains(&query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Status;

    fn record(site: &str, chargers: &[(&str, u32)], ancillaries: &[(&str, u32)]) -> SalesRecord {
        let catalog = Catalog::default();
        let mut ch = catalog.empty_counts(ItemKind::Charger);
        for (k, v) in chargers {
            ch.insert(k.to_string(), *v);
        }
        let mut an = catalog.empty_counts(ItemKind::Ancillary);
        for (k, v) in ancillaries {
            an.insert(k.to_string(), *v);
        }
        SalesRecord {
            id: format!("SR-{}", site),
            created_at: "2025-08-26 10:00:00".to_string(),
            date: "2025-08-26".to_string(),
            salesperson: "홍길동".to_string(),
            site_name: site.to_string(),
            manager_name: "담당".to_string(),
            phone: "010-1234-5678".to_string(),
            remarks: String::new(),
            status: Status::InProgress,
            reason: String::new(),
            totals: RecordTotals::compute(&ch, &an, &[]),
            chargers: ch,
            ancillaries: an,
            extras: vec![],
        }
    }

    #[test]
    fn test_total_quantity() {
        let mut counts = BTreeMap::new();
        counts.insert("a".to_string(), 1);
        counts.insert("b".to_string(), 2);
        counts.insert("c".to_string(), 3);
        assert_eq!(total_quantity(&counts), 6);
    }

    #[test]
    fn test_quantity_summary_follows_catalog_order() {
        let catalog = Catalog::default();
        let mut chargers = catalog.empty_counts(ItemKind::Charger);
        chargers.insert("3050A".to_string(), 1);
        chargers.insert("2100A".to_string(), 2);
        let mut ancillaries = catalog.empty_counts(ItemKind::Ancillary);
        ancillaries.insert("I형 볼라드".to_string(), 4);
        let extras = vec![ExtraItem::new("X-100", 3)];

        let summary = quantity_summary(&catalog, &chargers, &ancillaries, &extras);
        assert_eq!(
            summary,
            "2100A x 2, 3050A x 1, I형 볼라드 x 4, X-100 x 3  | 총 10개"
        );
    }

    #[test]
    fn test_quantity_summary_empty() {
        let catalog = Catalog::default();
        let summary = quantity_summary(
            &catalog,
            &catalog.empty_counts(ItemKind::Charger),
            &catalog.empty_counts(ItemKind::Ancillary),
            &[],
        );
        assert_eq!(summary, EMPTY_SUMMARY);
    }

    #[test]
    fn test_catalog_totals_sum_across_records() {
        let catalog = Catalog::default();
        let records = vec![
            record("A", &[("2100A", 1)], &[("바닥면도색", 1)]),
            record("B", &[("2100A", 2), ("1030A", 5)], &[]),
        ];
        let totals = catalog_totals(&catalog, ItemKind::Charger, &records);

        assert_eq!(totals.len(), catalog.chargers.len());
        assert!(totals.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(totals.contains(&("2100A".to_string(), 3)));
        assert!(totals.contains(&("1030A".to_string(), 5)));
        assert!(totals.contains(&("3050B".to_string(), 0)));
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let catalog = Catalog::default();
        let big = record("A", &[("2100A", u32::MAX), ("1100A", 5)], &[]);
        let other = record("B", &[("2100A", 3_000_000_000)], &[]);

        assert_eq!(total_quantity(&big.chargers), u32::MAX);
        assert!(record_summary(&catalog, &big).ends_with(&format!("총 {}개", u32::MAX)));

        let totals = catalog_totals(&catalog, ItemKind::Charger, &[big, other]);
        assert!(totals.contains(&("2100A".to_string(), u32::MAX)));

        let extras = vec![ExtraItem::new("X", u32::MAX), ExtraItem::new("Y", 1)];
        let computed = RecordTotals::compute(&BTreeMap::new(), &BTreeMap::new(), &extras);
        assert_eq!(computed.extras_total, u32::MAX);
    }

    #[test]
    fn test_matches_query() {
        let rec = record("Gangnam Tower", &[], &[]);
        assert!(matches_query(&rec, ""));
        assert!(matches_query(&rec, "gangnam"));
        assert!(matches_query(&rec, "2025-08"));
        assert!(matches_query(&rec, "진행중"));
        assert!(!matches_query(&rec, "busan"));
        assert_eq!(list_line(&rec), "2025-08-26 | Gangnam Tower | 홍길동 | 진행중");
    }
}
