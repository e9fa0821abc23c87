use chrono::{Duration, NaiveDate};
use contracts::dashboards::d402_merchant_tpv::{
    MerchantTpvDefaults, MerchantTpvResponse, MerchantTpvRow, MerchantTpvSummary, ReportStatus,
    TimeFilterDto,
};
use std::sync::Arc;

use super::aggregator::{aggregate, AggregatedRecord, ReportSummary};
use super::coordinator::{gather_with_progress, GatherOutcome};
use super::error::TpvResult;
use super::hermes_client::RowSource;
use super::input::{DateRange, ReportParams, DATE_FORMAT};
use crate::shared::config::{FailedDayPolicy, ReportConfig};
use crate::shared::format::format_cr;

/// Собрать отчёт TPV: запросы по дням, затем свод по MID
pub async fn generate_report<S>(
    source: Arc<S>,
    params: &ReportParams,
    policy: FailedDayPolicy,
) -> TpvResult<MerchantTpvResponse>
where
    S: RowSource + ?Sized + 'static,
{
    generate_report_with_progress(source, params, policy, |_, _| {}).await
}

pub async fn generate_report_with_progress<S, F>(
    source: Arc<S>,
    params: &ReportParams,
    policy: FailedDayPolicy,
    on_day: F,
) -> TpvResult<MerchantTpvResponse>
where
    S: RowSource + ?Sized + 'static,
    F: FnMut(NaiveDate, bool) + Send,
{
    let days = params.date_range.days();
    tracing::info!(
        "D402 Dashboard: fetching TPV for {} MIDs over {} days ({} - {}), time filter: {:?}, concurrency: {}",
        params.merchant_ids.len(),
        days.len(),
        params.date_range.start(),
        params.date_range.end(),
        params.time_filter,
        params.concurrency
    );

    let gathered = gather_with_progress(
        source,
        &days,
        &params.merchant_ids,
        params.time_filter,
        &params.auth,
        params.concurrency,
        on_day,
    )
    .await;

    let GatherOutcome {
        rows,
        days_total,
        failed_days,
    } = gathered;
    let status = if rows.is_empty() {
        ReportStatus::NoData
    } else {
        ReportStatus::Ready
    };
    tracing::info!(
        "D402 Dashboard: {} rows collected, {} of {} days failed",
        rows.len(),
        failed_days.len(),
        days_total
    );

    let (records, summary) = aggregate(rows, &params.merchant_ids)?;

    let failed_days = match policy {
        FailedDayPolicy::Report => Some(
            failed_days
                .iter()
                .map(|day| day.format(DATE_FORMAT).to_string())
                .collect(),
        ),
        FailedDayPolicy::Silent => None,
    };

    Ok(MerchantTpvResponse {
        title: report_title(&params.date_range),
        status,
        records: records.iter().map(to_row).collect(),
        summary: to_summary(&summary),
        days_total,
        failed_days,
    })
}

pub fn report_title(range: &DateRange) -> String {
    format!("TPV Report: {} to {}", range.start(), range.end())
}

fn to_row(record: &AggregatedRecord) -> MerchantTpvRow {
    MerchantTpvRow {
        mid: record.mid.to_string(),
        total_tpv: record.total_tpv,
        formatted_tpv: format_cr(record.total_tpv),
    }
}

fn to_summary(summary: &ReportSummary) -> MerchantTpvSummary {
    MerchantTpvSummary {
        total_mids: summary.total_mids,
        active_mids: summary.active_mids,
        total_volume: summary.total_volume,
        total_volume_formatted: format_cr(summary.total_volume),
    }
}

/// Значения формы по умолчанию: последние N дней, фильтр по часам выключен
pub fn defaults(today: NaiveDate, config: &ReportConfig) -> MerchantTpvDefaults {
    let date_from = today - Duration::days(config.default_lookback_days.max(0));
    MerchantTpvDefaults {
        date_from: date_from.format(DATE_FORMAT).to_string(),
        date_to: today.format(DATE_FORMAT).to_string(),
        time_filter_enabled: false,
        time_filter: TimeFilterDto {
            start_hour: 0,
            end_hour: 23,
        },
        merchant_ids: config.default_merchant_ids.clone(),
        concurrency: config.concurrency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d402_merchant_tpv::error::TpvError;
    use crate::dashboards::d402_merchant_tpv::hermes_client::{FetchOutcome, RawRow};
    use crate::dashboards::d402_merchant_tpv::input::AuthCookie;
    use async_trait::async_trait;
    use contracts::dashboards::d402_merchant_tpv::MerchantTpvRequest;
    use serde_json::json;

    /// Отдаёт одни и те же строки на каждый день; день 2 падает, если задано
    struct StaticSource {
        rows: Vec<RawRow>,
        fail_second_day: bool,
    }

    #[async_trait]
    impl RowSource for StaticSource {
        async fn fetch(&self, query: &str, _auth: &AuthCookie) -> FetchOutcome {
            if self.fail_second_day && query.contains("date.dayOfMonth = 2 ") {
                return FetchOutcome::degraded("HTTP 502");
            }
            FetchOutcome::Rows(self.rows.clone())
        }
    }

    fn hermes_row(mid: &str, amount: &str) -> RawRow {
        match json!({ "eventData.merchantId": mid, "sum(eventData.amount)": amount }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn params(mids: &str, from: &str, to: &str) -> ReportParams {
        let request = MerchantTpvRequest {
            cookie: "SESSION=abc".to_string(),
            date_from: from.to_string(),
            date_to: to.to_string(),
            time_filter: None,
            merchant_ids: mids.to_string(),
            concurrency: None,
        };
        ReportParams::from_request(&request, 5, 366).unwrap()
    }

    fn report_config() -> ReportConfig {
        ReportConfig {
            concurrency: 5,
            failed_day_policy: FailedDayPolicy::Report,
            default_merchant_ids: "SPEELONLINE, JASYATRATRAINONLINE".to_string(),
            default_lookback_days: 7,
            max_days: 366,
        }
    }

    #[tokio::test]
    async fn test_all_days_empty_is_no_data() {
        let source = Arc::new(StaticSource {
            rows: vec![],
            fail_second_day: false,
        });

        let report = generate_report(
            source,
            &params("A, B, C", "2025-01-01", "2025-01-03"),
            FailedDayPolicy::Report,
        )
        .await
        .unwrap();

        assert_eq!(report.status, ReportStatus::NoData);
        assert_eq!(report.days_total, 3);
        assert_eq!(report.summary.total_mids, 3);
        assert_eq!(report.summary.active_mids, 0);
        assert_eq!(report.summary.total_volume, 0.0);
        assert_eq!(report.records.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_mids_collapse() {
        let source = Arc::new(StaticSource {
            rows: vec![hermes_row("A", "100000000")],
            fail_second_day: false,
        });

        let report = generate_report(
            source,
            &params("A, A, B", "2025-01-01", "2025-01-01"),
            FailedDayPolicy::Report,
        )
        .await
        .unwrap();

        assert_eq!(report.status, ReportStatus::Ready);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].mid, "A");
        assert_eq!(report.records[0].total_tpv, 1_000_000.0);
        assert_eq!(report.records[0].formatted_tpv, "₹ 0.10 Cr");
        assert_eq!(report.records[1].formatted_tpv, "₹ 0.00 Cr");
        assert_eq!(report.title, "TPV Report: 2025-01-01 to 2025-01-01");
    }

    #[tokio::test]
    async fn test_failed_days_reported_by_policy() {
        let source = Arc::new(StaticSource {
            rows: vec![hermes_row("A", "5000")],
            fail_second_day: true,
        });
        let p = params("A", "2025-01-01", "2025-01-03");

        let reported = generate_report(source.clone(), &p, FailedDayPolicy::Report)
            .await
            .unwrap();
        let silent = generate_report(source, &p, FailedDayPolicy::Silent)
            .await
            .unwrap();

        assert_eq!(reported.failed_days, Some(vec!["2025-01-02".to_string()]));
        assert_eq!(reported.records[0].total_tpv, 100.0);
        assert_eq!(silent.failed_days, None);
        assert_eq!(silent.records, reported.records);
    }

    #[tokio::test]
    async fn test_schema_error_surfaces() {
        let mut bad = RawRow::new();
        bad.insert("eventData.merchantId".into(), json!("A"));
        bad.insert("count".into(), json!(3));
        let source = Arc::new(StaticSource {
            rows: vec![bad],
            fail_second_day: false,
        });

        let result = generate_report(
            source,
            &params("A", "2025-01-01", "2025-01-01"),
            FailedDayPolicy::Report,
        )
        .await;

        assert!(matches!(result, Err(TpvError::Schema(_))));
    }

    #[test]
    fn test_defaults_last_week() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let defaults = defaults(today, &report_config());

        assert_eq!(defaults.date_from, "2025-03-03");
        assert_eq!(defaults.date_to, "2025-03-10");
        assert!(!defaults.time_filter_enabled);
        assert_eq!(defaults.merchant_ids, "SPEELONLINE, JASYATRATRAINONLINE");
    }
}
