use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::api::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes(static_dir: &str) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // D402 Merchant TPV dashboard
        // ========================================
        .route(
            "/api/d402/defaults",
            get(handlers::d402_merchant_tpv::get_defaults),
        )
        .route(
            "/api/d402/merchant_tpv",
            post(handlers::d402_merchant_tpv::get_report),
        )
        .route(
            "/api/d402/merchant_tpv/export",
            post(handlers::d402_merchant_tpv::export_csv),
        )
        .route(
            "/api/d402/merchant_tpv/start",
            post(handlers::d402_merchant_tpv::start_report),
        )
        .route(
            "/api/d402/merchant_tpv/:session_id/progress",
            get(handlers::d402_merchant_tpv::get_progress),
        )
        // UI собирается отдельно и отдаётся как статика
        .fallback_service(ServeDir::new(static_dir))
}
