use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dto::MerchantTpvResponse;

/// Ответ на запуск фоновой сборки отчёта
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStartResponse {
    pub session_id: String,
    pub days_total: usize,
}

/// Текущий прогресс сборки отчёта
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProgress {
    pub session_id: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    /// Прогресс по дням периода
    pub days_done: usize,
    pub days_total: usize,
    pub days_failed: usize,

    /// Готовый отчёт (когда status = completed)
    pub report: Option<MerchantTpvResponse>,
    /// Текст ошибки (когда status = failed)
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Идут запросы к Hermes
    Running,
    /// Отчёт собран
    Completed,
    /// Сборка отчёта провалена
    Failed,
}

impl ReportProgress {
    pub fn new(session_id: String, days_total: usize) -> Self {
        Self {
            session_id,
            status: SessionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            updated_at: Utc::now(),
            days_done: 0,
            days_total,
            days_failed: 0,
            report: None,
            error: None,
        }
    }
}
