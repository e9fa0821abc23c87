pub mod dto;
pub mod progress;

pub use dto::{
    DashboardError, MerchantTpvDefaults, MerchantTpvRequest, MerchantTpvResponse, MerchantTpvRow,
    MerchantTpvSummary, ReportStatus, TimeFilterDto,
};
pub use progress::{ReportProgress, ReportStartResponse, SessionStatus};
