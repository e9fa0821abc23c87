use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::input::AuthCookie;
use crate::shared::config::HermesConfig;

/// Строка ответа Hermes, поля в порядке ответа
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Результат запроса за один день
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Ответ получен (возможно, пустой)
    Rows(Vec<RawRow>),
    /// День пропущен: таймаут, сеть, не-2xx или битый JSON
    Degraded { reason: String },
}

impl FetchOutcome {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
        }
    }
}

/// Источник строк для одного FQL-запроса.
///
/// Реализация никогда не возвращает ошибку: сбой дня отдаётся как `Degraded`.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch(&self, query: &str, auth: &AuthCookie) -> FetchOutcome;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FqlRequest<'a> {
    query: &'a str,
    extrapolation_flag: bool,
}

#[derive(Debug, Deserialize)]
struct FqlResponse {
    #[serde(default)]
    rows: Option<Vec<RawRow>>,
}

/// HTTP-клиент для FQL endpoint Hermes
pub struct HermesClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HermesClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &HermesConfig) -> anyhow::Result<Self> {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_query(&self, query: &str, auth: &AuthCookie) -> Result<Vec<RawRow>, String> {
        let body = serde_json::to_vec(&FqlRequest {
            query,
            extrapolation_flag: false,
        })
        .map_err(|e| format!("Failed to serialize request: {}", e))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(COOKIE, auth.expose())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("Timed out after {:?}", self.timeout)
                } else {
                    format!("HTTP request failed: {}", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, truncate(&body, 200)));
        }

        let parsed: FqlResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                format!("Timed out after {:?} while reading body", self.timeout)
            } else {
                format!("Malformed JSON response: {}", e)
            }
        })?;

        Ok(parsed.rows.unwrap_or_default())
    }
}

#[async_trait]
impl RowSource for HermesClient {
    async fn fetch(&self, query: &str, auth: &AuthCookie) -> FetchOutcome {
        match self.post_query(query, auth).await {
            Ok(rows) => {
                tracing::debug!("Hermes: got {} rows", rows.len());
                FetchOutcome::Rows(rows)
            }
            Err(reason) => FetchOutcome::degraded(reason),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
