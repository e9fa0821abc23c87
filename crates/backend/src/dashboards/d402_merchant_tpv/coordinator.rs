use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::hermes_client::{FetchOutcome, RawRow, RowSource};
use super::input::{AuthCookie, MerchantId, TimeFilter};
use super::query_builder::build_query;

/// Сырые строки за весь период
#[derive(Debug, Clone, Default)]
pub struct GatherOutcome {
    /// Строки в порядке завершения запросов
    pub rows: Vec<RawRow>,
    pub days_total: usize,
    /// Дни без ответа, по возрастанию
    pub failed_days: Vec<NaiveDate>,
}

impl GatherOutcome {
    pub fn days_failed(&self) -> usize {
        self.failed_days.len()
    }
}

/// Запросить все дни периода, не более `concurrency_limit` запросов одновременно.
///
/// Возвращает управление только когда завершились все дни. Сбой одного дня
/// не прерывает остальные.
pub async fn gather<S>(
    source: Arc<S>,
    days: &[NaiveDate],
    merchant_ids: &[MerchantId],
    time_filter: Option<TimeFilter>,
    auth: &AuthCookie,
    concurrency_limit: usize,
) -> GatherOutcome
where
    S: RowSource + ?Sized + 'static,
{
    gather_with_progress(
        source,
        days,
        merchant_ids,
        time_filter,
        auth,
        concurrency_limit,
        |_, _| {},
    )
    .await
}

/// То же, что [`gather`], но `on_day(day, ok)` вызывается после каждого дня
pub async fn gather_with_progress<S, F>(
    source: Arc<S>,
    days: &[NaiveDate],
    merchant_ids: &[MerchantId],
    time_filter: Option<TimeFilter>,
    auth: &AuthCookie,
    concurrency_limit: usize,
    mut on_day: F,
) -> GatherOutcome
where
    S: RowSource + ?Sized + 'static,
    F: FnMut(NaiveDate, bool) + Send,
{
    let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut pending: BTreeSet<NaiveDate> = BTreeSet::new();

    for &day in days {
        if !pending.insert(day) {
            continue;
        }
        let query = build_query(day, merchant_ids, time_filter);
        let source = source.clone();
        let auth = auth.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (day, FetchOutcome::degraded("Worker pool closed"));
            };
            (day, source.fetch(&query, &auth).await)
        });
    }

    let days_total = pending.len();
    let mut rows = Vec::new();
    let mut failed_days = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((day, FetchOutcome::Rows(day_rows))) => {
                tracing::debug!("D402: {} -> {} rows", day, day_rows.len());
                pending.remove(&day);
                rows.extend(day_rows);
                on_day(day, true);
            }
            Ok((day, FetchOutcome::Degraded { reason })) => {
                tracing::warn!("D402: day {} skipped: {}", day, reason);
                pending.remove(&day);
                failed_days.push(day);
                on_day(day, false);
            }
            Err(e) => {
                // День неизвестен; такие дни остаются в pending
                tracing::error!("D402: fetch task aborted: {}", e);
            }
        }
    }

    for day in std::mem::take(&mut pending) {
        failed_days.push(day);
        on_day(day, false);
    }
    failed_days.sort();

    if !failed_days.is_empty() {
        tracing::warn!(
            "D402: {} of {} days failed, report is partial",
            failed_days.len(),
            days_total
        );
    }

    GatherOutcome {
        rows,
        days_total,
        failed_days,
    }
}
