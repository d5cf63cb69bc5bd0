// ==========================================
// CheckPeso - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型、本地化数值规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod import_batch;
pub mod locale_number;
pub mod record;
pub mod sampling;
pub mod weighing;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use import_batch::{ImportSummary, RowIssue};
pub use locale_number::{finite_or_zero, format_locale_decimal, parse_locale_decimal, LocaleNumber};
pub use record::{RecordFilter, RecordMetadata, WeightAuditRecord};
pub use sampling::{validate_sampling_ranges, SamplingRange, S4_PLAN_ID, S4_RANGES};
pub use weighing::{LossResult, RawWeighingInput, WeighingInput};
