// ==========================================
// CheckPeso - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行与上层界面调用
// ==========================================

pub mod audit_api;
pub mod config_api;
pub mod error;
pub mod import_api;
pub mod report_api;
pub mod validator;

// 重导出核心类型
pub use audit_api::{
    DeleteRecordResponse, PreviewResponse, RecordListResponse, RecordMutationResponse,
    WeighingForm, WeightAuditApi,
};
pub use config_api::{ConfigApi, ConfigItem, SampleSizeInfo, SamplingPlanList};
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use import_api::ImportApi;
pub use report_api::ReportApi;
pub use validator::validate_weighing_input;
