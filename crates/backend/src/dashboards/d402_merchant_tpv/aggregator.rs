use serde_json::Value;
use std::collections::BTreeMap;

use super::error::{TpvError, TpvResult};
use super::hermes_client::RawRow;
use super::input::MerchantId;

/// Суммы приходят в пайсах
pub const MINOR_UNITS_PER_MAJOR: f64 = 100.0;

/// Итог по одному MID, в рупиях
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub mid: MerchantId,
    pub total_tpv: f64,
}

/// Сводка по отчёту
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSummary {
    pub total_mids: usize,
    pub active_mids: usize,
    pub total_volume: f64,
}

impl ReportSummary {
    pub fn from_records(records: &[AggregatedRecord]) -> Self {
        Self {
            total_mids: records.len(),
            active_mids: records.iter().filter(|r| r.total_tpv > 0.0).count(),
            total_volume: records.iter().fold(0.0, |acc, r| acc + r.total_tpv),
        }
    }
}

/// Поле суммы: первое поле строки, в имени которого есть "sum" или "amount"
pub fn detect_value_field(row: &RawRow) -> Option<&str> {
    row.keys().map(String::as_str).find(|name| {
        let lower = name.to_lowercase();
        lower.contains("sum") || lower.contains("amount")
    })
}

/// Поле MID: первое поле с "merchantid" в имени, иначе поле `id` / `mid`
pub fn detect_merchant_field(row: &RawRow) -> Option<&str> {
    let keys = || row.keys().map(String::as_str);
    keys()
        .find(|name| name.to_lowercase().contains("merchantid"))
        .or_else(|| {
            keys().find(|name| name.eq_ignore_ascii_case("id") || name.eq_ignore_ascii_case("mid"))
        })
}

/// Свести строки всех дней в одну запись на каждый запрошенный MID.
///
/// Результат не зависит от порядка `rows`: значения каждого MID
/// сортируются перед суммированием. MID без данных получают 0.
/// Записи отсортированы по MID.
pub fn aggregate(
    rows: Vec<RawRow>,
    requested_ids: &[MerchantId],
) -> TpvResult<(Vec<AggregatedRecord>, ReportSummary)> {
    let mut groups: BTreeMap<&str, Vec<f64>> = requested_ids
        .iter()
        .map(|mid| (mid.as_str(), Vec::new()))
        .collect();
    let mut ignored = 0usize;

    for (idx, row) in rows.iter().enumerate() {
        let value_field = detect_value_field(row).ok_or_else(|| {
            TpvError::schema(format!(
                "No sum/amount field in row {} (fields: {})",
                idx,
                field_list(row)
            ))
        })?;
        let merchant_field = detect_merchant_field(row).ok_or_else(|| {
            TpvError::schema(format!(
                "No merchant id field in row {} (fields: {})",
                idx,
                field_list(row)
            ))
        })?;

        let mid = merchant_value(&row[merchant_field]).ok_or_else(|| {
            TpvError::schema(format!(
                "Field '{}' in row {} is not a merchant id: {}",
                merchant_field, idx, row[merchant_field]
            ))
        })?;
        let minor_units = numeric_value(&row[value_field]).ok_or_else(|| {
            TpvError::schema(format!(
                "Field '{}' in row {} is not numeric: {}",
                value_field, idx, row[value_field]
            ))
        })?;
        if minor_units < 0.0 {
            return Err(TpvError::schema(format!(
                "Field '{}' in row {} is negative: {}",
                value_field, idx, row[value_field]
            )));
        }

        match groups.get_mut(mid.as_str()) {
            Some(values) => values.push(minor_units),
            None => ignored += 1,
        }
    }

    if ignored > 0 {
        tracing::warn!("D402: ignored {} rows for merchants that were not requested", ignored);
    }

    let mut records: Vec<AggregatedRecord> = requested_ids
        .iter()
        .filter_map(|mid| groups.remove(mid.as_str()).map(|values| (mid, values)))
        .map(|(mid, mut values)| {
            values.sort_by(f64::total_cmp);
            let minor_total = values.into_iter().fold(0.0, |acc, v| acc + v);
            AggregatedRecord {
                mid: mid.clone(),
                total_tpv: minor_total / MINOR_UNITS_PER_MAJOR,
            }
        })
        .collect();
    records.sort_by(|a, b| a.mid.cmp(&b.mid));

    let summary = ReportSummary::from_records(&records);
    Ok((records, summary))
}

fn merchant_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Число или числовая строка; null считается нулём
fn numeric_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn field_list(row: &RawRow) -> String {
    row.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn mids(names: &[&str]) -> Vec<MerchantId> {
        names.iter().filter_map(|n| MerchantId::new(n)).collect()
    }

    fn hermes_row(mid: &str, amount: i64) -> RawRow {
        row(json!({ "eventData.merchantId": mid, "sum(eventData.amount)": amount }))
    }

    #[test]
    fn test_scenario_missing_mid_is_zero() {
        let rows = vec![row(json!({ "id": "A", "sum_amount": "50000" }))];

        let (records, summary) = aggregate(rows, &mids(&["A", "B"])).unwrap();

        assert_eq!(
            records,
            vec![
                AggregatedRecord { mid: MerchantId::new("A").unwrap(), total_tpv: 500.0 },
                AggregatedRecord { mid: MerchantId::new("B").unwrap(), total_tpv: 0.0 },
            ]
        );
        assert_eq!(summary.total_mids, 2);
        assert_eq!(summary.active_mids, 1);
        assert_eq!(summary.total_volume, 500.0);
    }

    #[test]
    fn test_sums_across_days_and_sorts() {
        let rows = vec![
            hermes_row("ZETA", 100),
            hermes_row("ALPHA", 250),
            hermes_row("ZETA", 900),
            hermes_row("ALPHA", 50),
        ];

        let (records, summary) = aggregate(rows, &mids(&["ZETA", "ALPHA", "MID"])).unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.mid.as_str()).collect();
        assert_eq!(names, vec!["ALPHA", "MID", "ZETA"]);
        assert_eq!(records[0].total_tpv, 3.0);
        assert_eq!(records[1].total_tpv, 0.0);
        assert_eq!(records[2].total_tpv, 10.0);
        assert_eq!(summary.total_volume, 13.0);
        assert_eq!(summary.active_mids, 2);
    }

    #[test]
    fn test_one_record_per_requested_id() {
        let rows = vec![hermes_row("A", 1), hermes_row("C", 1)];
        let requested = mids(&["A", "B", "C", "D"]);

        let (records, summary) = aggregate(rows, &requested).unwrap();

        assert_eq!(records.len(), requested.len());
        assert_eq!(summary.total_mids, 4);
        let mut names: Vec<&str> = records.iter().map(|r| r.mid.as_str()).collect();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_unrequested_rows_are_ignored() {
        let rows = vec![hermes_row("A", 100), hermes_row("STRANGER", 999_999)];

        let (records, summary) = aggregate(rows, &mids(&["A"])).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(summary.total_volume, 1.0);
    }

    #[test]
    fn test_merchant_ids_are_case_sensitive() {
        let rows = vec![hermes_row("a", 100)];

        let (records, _) = aggregate(rows, &mids(&["A"])).unwrap();

        assert_eq!(records[0].total_tpv, 0.0);
    }

    #[test]
    fn test_permutation_invariant_and_idempotent() {
        let amounts = [10_000_001_i64, 3, 77_777_777, 1, 123_456_789, 5, 99];
        let forward: Vec<RawRow> = amounts.iter().map(|a| hermes_row("A", *a)).collect();
        let mut backward = forward.clone();
        backward.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(3);
        let requested = mids(&["A", "B"]);

        let first = aggregate(forward.clone(), &requested).unwrap();
        let again = aggregate(forward, &requested).unwrap();
        let reversed = aggregate(backward, &requested).unwrap();
        let shifted = aggregate(rotated, &requested).unwrap();

        assert_eq!(first, again);
        assert_eq!(first.0[0].total_tpv.to_bits(), reversed.0[0].total_tpv.to_bits());
        assert_eq!(first.0[0].total_tpv.to_bits(), shifted.0[0].total_tpv.to_bits());
        assert_eq!(first.1.total_volume.to_bits(), reversed.1.total_volume.to_bits());
    }

    #[test]
    fn test_no_value_field_is_schema_error() {
        let rows = vec![row(json!({ "eventData.merchantId": "A", "count": 4 }))];

        let result = aggregate(rows, &mids(&["A"]));

        assert!(matches!(result, Err(TpvError::Schema(_))));
    }

    #[test]
    fn test_no_merchant_field_is_schema_error() {
        let rows = vec![row(json!({ "name": "A", "amount": 4 }))];

        assert!(matches!(aggregate(rows, &mids(&["A"])), Err(TpvError::Schema(_))));
    }

    #[test]
    fn test_non_numeric_value_is_schema_error() {
        let rows = vec![row(json!({ "eventData.merchantId": "A", "sum": "n/a" }))];

        assert!(matches!(aggregate(rows, &mids(&["A"])), Err(TpvError::Schema(_))));
    }

    #[test]
    fn test_negative_value_is_schema_error() {
        let rows = vec![
            row(json!({ "eventData.merchantId": "A", "sum(eventData.amount)": "-50000" })),
            hermes_row("B", 100000),
        ];

        let err = aggregate(rows, &mids(&["A", "B"])).unwrap_err();

        assert!(matches!(&err, TpvError::Schema(msg) if msg.contains("negative")));
    }

    #[test]
    fn test_totals_are_never_negative() {
        let rows = vec![hermes_row("A", 0), hermes_row("B", 1), hermes_row("A", 7)];

        let (records, summary) = aggregate(rows, &mids(&["A", "B", "C"])).unwrap();

        assert!(records.iter().all(|r| r.total_tpv >= 0.0 && r.total_tpv.is_sign_positive()));
        assert!(summary.total_volume >= 0.0);
        assert_eq!(summary.active_mids, 2);
    }

    #[test]
    fn test_null_value_counts_as_zero() {
        let rows = vec![
            row(json!({ "eventData.merchantId": "A", "sum(eventData.amount)": null })),
            hermes_row("A", 200),
        ];

        let (records, _) = aggregate(rows, &mids(&["A"])).unwrap();

        assert_eq!(records[0].total_tpv, 2.0);
    }

    #[test]
    fn test_empty_rows_all_zero() {
        let (records, summary) = aggregate(vec![], &mids(&["A", "B", "C"])).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.total_tpv == 0.0 && r.total_tpv.is_sign_positive()));
        assert_eq!(summary.total_mids, 3);
        assert_eq!(summary.active_mids, 0);
        assert_eq!(summary.total_volume, 0.0);
    }

    #[test]
    fn test_detect_value_field_takes_first_match() {
        let r = row(json!({ "eventData.merchantId": "A", "Amount": 1, "sum(x)": 2 }));
        assert_eq!(detect_value_field(&r), Some("Amount"));
    }

    #[test]
    fn test_detect_merchant_field_prefers_merchant_id() {
        let r = row(json!({ "id": "X", "eventData.merchantId": "A", "sum": 1 }));
        assert_eq!(detect_merchant_field(&r), Some("eventData.merchantId"));

        let r = row(json!({ "MID": "A", "sum": 1 }));
        assert_eq!(detect_merchant_field(&r), Some("MID"));
    }

    #[test]
    fn test_numeric_merchant_id() {
        let rows = vec![row(json!({ "merchantId": 12345, "amount": "100" }))];

        let (records, _) = aggregate(rows, &mids(&["12345"])).unwrap();

        assert_eq!(records[0].total_tpv, 1.0);
    }
}
