use contracts::dashboards::d402_merchant_tpv::{
    MerchantTpvRequest, MerchantTpvResponse, ReportProgress, ReportStartResponse,
};
use once_cell::sync::OnceCell;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use super::error::TpvResult;
use super::hermes_client::{HermesClient, RowSource};
use super::input::ReportParams;
use super::progress_tracker::ProgressTracker;
use super::service;
use crate::shared::config::{Config, ReportConfig};

/// Сколько часов хранить завершённые сессии
const SESSION_TTL_HOURS: i64 = 6;

static REPORT_EXECUTOR: OnceCell<Arc<ReportExecutor>> = OnceCell::new();

/// Создать executor с клиентом Hermes из конфига (один раз при старте)
pub fn initialize_executor(config: &Config) -> anyhow::Result<()> {
    let client = HermesClient::from_config(&config.hermes)?;
    tracing::info!(
        "D402: Hermes endpoint {} (timeout {}s)",
        client.endpoint(),
        config.hermes.timeout_secs
    );
    let executor = ReportExecutor::new(
        Arc::new(client),
        Arc::new(ProgressTracker::new()),
        config.report.clone(),
    );
    REPORT_EXECUTOR
        .set(Arc::new(executor))
        .map_err(|_| anyhow::anyhow!("D402 executor is already initialized"))
}

pub fn get_executor() -> Option<&'static Arc<ReportExecutor>> {
    REPORT_EXECUTOR.get()
}

/// Executor отчёта TPV: синхронная сборка и фоновые сессии
pub struct ReportExecutor {
    source: Arc<dyn RowSource>,
    pub progress_tracker: Arc<ProgressTracker>,
    report_config: ReportConfig,
}

impl ReportExecutor {
    pub fn new(
        source: Arc<dyn RowSource>,
        progress_tracker: Arc<ProgressTracker>,
        report_config: ReportConfig,
    ) -> Self {
        Self {
            source,
            progress_tracker,
            report_config,
        }
    }

    pub fn report_config(&self) -> &ReportConfig {
        &self.report_config
    }

    /// Проверка входных данных до любых запросов к Hermes
    pub fn params_from(&self, request: &MerchantTpvRequest) -> TpvResult<ReportParams> {
        ReportParams::from_request(
            request,
            self.report_config.concurrency,
            self.report_config.max_days,
        )
    }

    /// Собрать отчёт и дождаться результата
    pub async fn run_report(&self, request: &MerchantTpvRequest) -> TpvResult<MerchantTpvResponse> {
        let params = self.params_from(request)?;
        service::generate_report(
            self.source.clone(),
            &params,
            self.report_config.failed_day_policy,
        )
        .await
    }

    /// Запустить сборку в фоне (создаёт async task и возвращает session_id)
    pub fn start_report(
        self: &Arc<Self>,
        request: &MerchantTpvRequest,
    ) -> TpvResult<ReportStartResponse> {
        let params = self.params_from(request)?;
        let days_total = params.date_range.day_count();

        self.progress_tracker.cleanup_old_sessions(SESSION_TTL_HOURS);
        let session_id = Uuid::new_v4().to_string();
        self.progress_tracker
            .create_session(session_id.clone(), days_total);

        let executor = self.clone();
        let tracker = self.progress_tracker.clone();
        let sid = session_id.clone();
        let job = async move {
            service::generate_report_with_progress(
                executor.source.clone(),
                &params,
                executor.report_config.failed_day_policy,
                |_, ok| tracker.day_finished(&sid, ok),
            )
            .await
        };
        spawn_session(self.progress_tracker.clone(), session_id.clone(), job);

        Ok(ReportStartResponse {
            session_id,
            days_total,
        })
    }

    /// Получить прогресс сессии
    pub fn get_progress(&self, session_id: &str) -> Option<ReportProgress> {
        self.progress_tracker.get_progress(session_id)
    }
}

/// Запустить сборку в отдельной задаче; паника задачи переводит сессию в Failed
fn spawn_session<F>(tracker: Arc<ProgressTracker>, session_id: String, job: F)
where
    F: Future<Output = TpvResult<MerchantTpvResponse>> + Send + 'static,
{
    tokio::spawn(async move {
        match tokio::spawn(job).await {
            Ok(Ok(report)) => {
                tracing::info!("D402: session {} completed ({:?})", session_id, report.status);
                tracker.complete_session(&session_id, report);
            }
            Ok(Err(e)) => {
                tracing::error!("D402: session {} failed: {}", session_id, e);
                tracker.fail_session(&session_id, e.to_string());
            }
            Err(e) => {
                tracing::error!("D402: session {} task aborted: {}", session_id, e);
                tracker.fail_session(&session_id, format!("Report task aborted: {}", e));
            }
        }
    });
}
