// ==========================================
// CheckPeso - 配置层
// ==========================================
// 职责: 系统配置管理（抽样方案、报表、表格镜像）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod report_config_trait;
pub mod sampling_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use report_config_trait::ReportConfigReader;
pub use sampling_profile::SamplingPlanProfile;
