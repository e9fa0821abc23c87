use serde::{Deserialize, Serialize};

/// Запрос отчёта TPV по списку мерчантов
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantTpvRequest {
    /// Значение заголовка Cookie для Hermes API (передаётся как есть)
    pub cookie: String,
    /// Начало периода (включительно), формат YYYY-MM-DD
    pub date_from: String,
    /// Конец периода (включительно), формат YYYY-MM-DD
    pub date_to: String,
    /// Фильтр по часу суток, None = без ограничения
    #[serde(default)]
    pub time_filter: Option<TimeFilterDto>,
    /// MID через запятую или с новой строки
    pub merchant_ids: String,
    /// Сколько дней запрашивать параллельно (по умолчанию из config.toml)
    #[serde(default)]
    pub concurrency: Option<usize>,
}

/// Границы часа суток, обе включительно, 0..=23
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilterDto {
    pub start_hour: u32,
    pub end_hour: u32,
}

/// Итоговый отчёт
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantTpvResponse {
    /// "TPV Report: 2025-01-01 to 2025-01-07"
    pub title: String,
    pub status: ReportStatus,
    /// Одна строка на каждый запрошенный MID, отсортировано по MID
    pub records: Vec<MerchantTpvRow>,
    pub summary: MerchantTpvSummary,
    /// Сколько дней было запрошено
    pub days_total: usize,
    /// Дни, по которым запрос не удался (только при failed_day_policy = "report")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_days: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Есть хотя бы одна строка от API
    Ready,
    /// API не вернул ни одной строки ни за один день
    NoData,
}

/// Строка таблицы отчёта
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantTpvRow {
    pub mid: String,
    /// TPV в рупиях
    pub total_tpv: f64,
    /// "₹ 1.23 Cr"
    pub formatted_tpv: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantTpvSummary {
    pub total_mids: usize,
    pub active_mids: usize,
    pub total_volume: f64,
    pub total_volume_formatted: String,
}

/// Значения формы по умолчанию
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantTpvDefaults {
    pub date_from: String,
    pub date_to: String,
    pub time_filter_enabled: bool,
    pub time_filter: TimeFilterDto,
    pub merchant_ids: String,
    pub concurrency: usize,
}

/// Тело ответа при ошибке
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardError {
    pub code: String,
    pub message: String,
}

impl DashboardError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new("SCHEMA_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}
