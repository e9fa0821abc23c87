use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use contracts::dashboards::d402_merchant_tpv::{
    DashboardError, MerchantTpvDefaults, MerchantTpvRequest, MerchantTpvResponse, ReportProgress,
    ReportStartResponse, ReportStatus,
};
use std::sync::Arc;

use crate::dashboards::d402_merchant_tpv::{export, get_executor, service, ReportExecutor, TpvError};

type ApiError = (StatusCode, Json<DashboardError>);

const NO_DATA_MESSAGE: &str = "No TPV data found for the selected MIDs and Date Range.";

fn executor() -> Result<&'static Arc<ReportExecutor>, ApiError> {
    get_executor().ok_or_else(|| {
        tracing::error!("D402 Dashboard: executor is not initialized");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DashboardError::internal("Report executor is not initialized")),
        )
    })
}

fn map_error(error: TpvError) -> ApiError {
    match error {
        TpvError::Input(message) => {
            tracing::warn!("D402 Dashboard: rejected request: {}", message);
            (
                StatusCode::BAD_REQUEST,
                Json(DashboardError::validation(message)),
            )
        }
        TpvError::Schema(message) => {
            tracing::error!("D402 Dashboard: unexpected Hermes schema: {}", message);
            (StatusCode::BAD_GATEWAY, Json(DashboardError::schema(message)))
        }
    }
}

/// POST /api/d402/merchant_tpv
pub async fn get_report(
    Json(request): Json<MerchantTpvRequest>,
) -> Result<Json<MerchantTpvResponse>, ApiError> {
    let report = executor()?.run_report(&request).await.map_err(map_error)?;

    tracing::info!(
        "D402 Dashboard: returning {} rows ({:?}), active {} of {}",
        report.records.len(),
        report.status,
        report.summary.active_mids,
        report.summary.total_mids
    );
    Ok(Json(report))
}

/// POST /api/d402/merchant_tpv/export
pub async fn export_csv(Json(request): Json<MerchantTpvRequest>) -> Result<Response, ApiError> {
    let report = executor()?.run_report(&request).await.map_err(map_error)?;

    if report.status == ReportStatus::NoData {
        return Err((
            StatusCode::NOT_FOUND,
            Json(DashboardError::new("NO_DATA", NO_DATA_MESSAGE)),
        ));
    }

    let csv = export::to_csv(&report.records).map_err(|e| {
        tracing::error!("D402 Dashboard: CSV export failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(DashboardError::internal(e.to_string())),
        )
    })?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export::EXPORT_FILE_NAME),
        ),
    ];
    Ok((headers, csv).into_response())
}

/// POST /api/d402/merchant_tpv/start
pub async fn start_report(
    Json(request): Json<MerchantTpvRequest>,
) -> Result<Json<ReportStartResponse>, ApiError> {
    let started = executor()?.start_report(&request).map_err(map_error)?;
    tracing::info!(
        "D402 Dashboard: session {} started for {} days",
        started.session_id,
        started.days_total
    );
    Ok(Json(started))
}

/// GET /api/d402/merchant_tpv/:session_id/progress
pub async fn get_progress(
    Path(session_id): Path<String>,
) -> Result<Json<ReportProgress>, StatusCode> {
    let executor = get_executor().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    match executor.get_progress(&session_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// GET /api/d402/defaults
pub async fn get_defaults() -> Result<Json<MerchantTpvDefaults>, ApiError> {
    let today = chrono::Local::now().date_naive();
    Ok(Json(service::defaults(today, executor()?.report_config())))
}
