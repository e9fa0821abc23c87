use contracts::dashboards::d402_merchant_tpv::{MerchantTpvResponse, ReportProgress, SessionStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Трекер прогресса сборки отчётов (in-memory)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, ReportProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, ReportProgress>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, ReportProgress>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    fn update(&self, session_id: &str, apply: impl FnOnce(&mut ReportProgress)) {
        if let Some(p) = self.write().get_mut(session_id) {
            apply(p);
            p.updated_at = chrono::Utc::now();
        }
    }

    pub fn create_session(&self, session_id: String, days_total: usize) {
        self.write().insert(
            session_id.clone(),
            ReportProgress::new(session_id, days_total),
        );
    }

    pub fn get_progress(&self, session_id: &str) -> Option<ReportProgress> {
        self.read().get(session_id).cloned()
    }

    /// Завершён один день периода
    pub fn day_finished(&self, session_id: &str, ok: bool) {
        self.update(session_id, |p| {
            p.days_done += 1;
            if !ok {
                p.days_failed += 1;
            }
        });
    }

    pub fn complete_session(&self, session_id: &str, report: MerchantTpvResponse) {
        self.update(session_id, |p| {
            p.status = SessionStatus::Completed;
            p.report = Some(report);
            p.completed_at = Some(chrono::Utc::now());
        });
    }

    pub fn fail_session(&self, session_id: &str, error: String) {
        self.update(session_id, |p| {
            p.status = SessionStatus::Failed;
            p.error = Some(error);
            p.completed_at = Some(chrono::Utc::now());
        });
    }

    /// Удалить завершённые сессии старше `max_age_hours`
    pub fn cleanup_old_sessions(&self, max_age_hours: i64) {
        let now = chrono::Utc::now();
        self.write().retain(|_, p| match p.completed_at {
            Some(completed_at) => (now - completed_at).num_hours() < max_age_hours,
            None => true,
        });
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
