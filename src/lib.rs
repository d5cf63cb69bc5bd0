// ==========================================
// CheckPeso - 核心库
// ==========================================
// 收货称重抽检（S4 抽样表）与失重核算
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "pt-BR");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与值类型
pub mod domain;

// 数据仓储层 - 数据访问与表格镜像
pub mod repository;

// 引擎层 - 抽样表与失重核算
pub mod engine;

// 导入层 - 历史称重表
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 报表层 - WhatsApp / 邮件 / HTML / CSV
pub mod report;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ActionLog, ActionType, LocaleNumber, LossResult, RawWeighingInput, RecordFilter,
    RecordMetadata, WeighingInput, WeightAuditRecord,
};

// 引擎
pub use engine::{calculate_loss, resolve_sample_size, LossEngine, SamplingTableResolver};

// API
pub use api::{ConfigApi, ImportApi, ReportApi, WeightAuditApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "CheckPeso";
