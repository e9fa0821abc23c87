use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub hermes: HermesConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Каталог со сборкой UI, отдаётся как fallback
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HermesConfig {
    /// FQL endpoint
    pub endpoint: String,
    /// Таймаут одного запроса (на один день периода)
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Сколько дней запрашивается параллельно
    pub concurrency: usize,
    pub failed_day_policy: FailedDayPolicy,
    /// MID, подставляемые в форму по умолчанию
    pub default_merchant_ids: String,
    /// Длина периода по умолчанию (дней назад от сегодня)
    pub default_lookback_days: i64,
    /// Максимальная длина периода одного отчёта, дней
    #[serde(default = "default_max_days")]
    pub max_days: usize,
}

fn default_max_days() -> usize {
    366
}

/// Что делать с днями, по которым Hermes не ответил
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailedDayPolicy {
    /// Только запись в лог, в ответе ничего
    Silent,
    /// Список неудачных дней возвращается в ответе
    Report,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000
static_dir = "dist"

[hermes]
endpoint = "https://echoredux-internal.phonepe.com/apis/moses/v2/fql/extrapolation"
timeout_secs = 45

[report]
concurrency = 5
failed_day_policy = "report"
default_merchant_ids = "SPEELONLINE, JASYATRATRAINONLINE"
default_lookback_days = 7
max_days = 366
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                return load_config_from(&config_path);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.report.concurrency == 0 {
        anyhow::bail!("report.concurrency must be at least 1");
    }
    if config.hermes.timeout_secs == 0 {
        anyhow::bail!("hermes.timeout_secs must be at least 1");
    }
    if config.report.max_days == 0 {
        anyhow::bail!("report.max_days must be at least 1");
    }
    let lookback = config.report.default_lookback_days;
    if lookback < 0 || lookback as u64 >= config.report.max_days as u64 {
        anyhow::bail!(
            "report.default_lookback_days must be within 0..{}, got {}",
            config.report.max_days,
            lookback
        );
    }
    Ok(config)
}
