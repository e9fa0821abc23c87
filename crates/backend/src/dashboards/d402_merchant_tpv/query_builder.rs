use chrono::{Datelike, NaiveDate};

use super::input::{MerchantId, TimeFilter};

/// Источник событий в Hermes
pub const SOURCE_TABLE: &str = "hermes";
/// Поле с MID мерчанта
pub const MERCHANT_FIELD: &str = "eventData.merchantId";
/// Поле суммы транзакции (в пайсах)
pub const AMOUNT_FIELD: &str = "eventData.amount";
/// Успешные события, которые считаются в TPV
pub const SUCCESS_EVENT_TYPES: [&str; 2] = ["CALLBACK_SUCCESS", "REDEMPTION_V2_SUCCESS"];

/// Построить FQL-запрос суммы по MID за один календарный день.
///
/// День фильтруется точным совпадением года, месяца и числа, а не диапазоном.
pub fn build_query(
    day: NaiveDate,
    merchant_ids: &[MerchantId],
    time_filter: Option<TimeFilter>,
) -> String {
    let mid_list = merchant_ids
        .iter()
        .map(|mid| quote_literal(mid.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let event_list = SUCCESS_EVENT_TYPES
        .iter()
        .map(|event| quote_literal(event))
        .collect::<Vec<_>>()
        .join(", ");

    let mut conditions = vec![
        format!("{} IN ({})", MERCHANT_FIELD, mid_list),
        format!("date.dayOfMonth = {}", day.day()),
        format!("date.monthOfYear = {}", day.month()),
        format!("date.year = {}", day.year()),
    ];

    if let Some(filter) = time_filter {
        conditions.push(format!("date.hourOfDay >= {}", filter.start_hour));
        conditions.push(format!("date.hourOfDay <= {}", filter.end_hour));
    }

    conditions.push(format!("eventType IN ({})", event_list));

    format!(
        "SELECT {mid}, sum({amount}) FROM {table} WHERE {where_clause} GROUP BY {mid}",
        mid = MERCHANT_FIELD,
        amount = AMOUNT_FIELD,
        table = SOURCE_TABLE,
        where_clause = conditions.join(" AND "),
    )
}

/// Строковый литерал FQL: кавычка удваивается, обратный слэш экранируется
fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}
