use chrono::NaiveDate;
use contracts::dashboards::d402_merchant_tpv::{MerchantTpvRequest, TimeFilterDto};
use reqwest::header::HeaderValue;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::error::{TpvError, TpvResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Верхняя граница параллельных запросов на один отчёт
pub const MAX_CONCURRENCY: usize = 32;

/// Идентификатор мерчанта (MID), регистр значим
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MerchantId(String);

impl MerchantId {
    /// Обрезает пробелы; пустая строка не является MID
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Разбор списка MID из текстового поля формы.
///
/// Разделители: запятая и перевод строки. Дубликаты удаляются,
/// порядок первого вхождения сохраняется.
pub fn parse_merchant_ids(raw: &str) -> TpvResult<Vec<MerchantId>> {
    let mut seen = HashSet::new();
    let mids: Vec<MerchantId> = raw
        .split([',', '\n', '\r'])
        .filter_map(MerchantId::new)
        .filter(|mid| seen.insert(mid.clone()))
        .collect();

    if mids.is_empty() {
        return Err(TpvError::input("Merchant ID list is empty"));
    }
    Ok(mids)
}

/// Период отчёта, обе границы включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> TpvResult<Self> {
        if start > end {
            return Err(TpvError::input(format!(
                "Start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Разбор пары дат в формате YYYY-MM-DD
    pub fn parse(date_from: &str, date_to: &str) -> TpvResult<Self> {
        Self::new(parse_date(date_from)?, parse_date(date_to)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Все календарные дни периода по возрастанию
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }

    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }
}

fn parse_date(raw: &str) -> TpvResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| TpvError::input(format!("Invalid date '{}': {}", raw, e)))
}

/// Ограничение по часу суток, [start_hour, end_hour] включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFilter {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeFilter {
    pub fn new(start_hour: u32, end_hour: u32) -> TpvResult<Self> {
        if start_hour > 23 || end_hour > 23 {
            return Err(TpvError::input(format!(
                "Hours must be within 0..=23, got {}..{}",
                start_hour, end_hour
            )));
        }
        if start_hour > end_hour {
            return Err(TpvError::input(format!(
                "Start hour {} is after end hour {}",
                start_hour, end_hour
            )));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }
}

impl TryFrom<TimeFilterDto> for TimeFilter {
    type Error = TpvError;

    fn try_from(dto: TimeFilterDto) -> TpvResult<Self> {
        Self::new(dto.start_hour, dto.end_hour)
    }
}

/// Значение Cookie для Hermes. Не выводится в логи.
#[derive(Clone)]
pub struct AuthCookie(Arc<str>);

impl AuthCookie {
    pub fn new(raw: &str) -> TpvResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TpvError::input("Cookie is empty"));
        }
        if HeaderValue::from_str(trimmed).is_err() {
            return Err(TpvError::input(
                "Cookie contains characters not allowed in an HTTP header",
            ));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthCookie(***)")
    }
}

/// Все параметры одной сборки отчёта
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub date_range: DateRange,
    pub merchant_ids: Vec<MerchantId>,
    pub time_filter: Option<TimeFilter>,
    pub auth: AuthCookie,
    pub concurrency: usize,
}

impl ReportParams {
    /// Проверка запроса из формы. Ошибка возвращается до любых сетевых вызовов.
    pub fn from_request(
        request: &MerchantTpvRequest,
        default_concurrency: usize,
        max_days: usize,
    ) -> TpvResult<Self> {
        let auth = AuthCookie::new(&request.cookie)?;
        let date_range = DateRange::parse(&request.date_from, &request.date_to)?;
        if date_range.day_count() > max_days {
            return Err(TpvError::input(format!(
                "Date range of {} days exceeds the limit of {} days",
                date_range.day_count(),
                max_days
            )));
        }
        let merchant_ids = parse_merchant_ids(&request.merchant_ids)?;
        let time_filter = request.time_filter.map(TimeFilter::try_from).transpose()?;

        let concurrency = request.concurrency.unwrap_or(default_concurrency);
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(TpvError::input(format!(
                "Concurrency must be within 1..={}, got {}",
                MAX_CONCURRENCY, concurrency
            )));
        }

        Ok(Self {
            date_range,
            merchant_ids,
            time_filter,
            auth,
            concurrency,
        })
    }
}
