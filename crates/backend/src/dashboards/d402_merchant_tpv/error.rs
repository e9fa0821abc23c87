use thiserror::Error;

/// Ошибки сборки отчёта TPV
///
/// Сетевые ошибки сюда не попадают: неудачный день превращается в
/// `FetchOutcome::Degraded` внутри клиента Hermes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TpvError {
    /// Некорректные входные данные, проверяются до любых запросов к API
    #[error("Invalid input: {0}")]
    Input(String),

    /// В строках ответа не найдено поле суммы или MID
    #[error("Schema error: {0}")]
    Schema(String),
}

pub type TpvResult<T> = Result<T, TpvError>;

impl TpvError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}
