// ==========================================
// CheckPeso - 引擎层
// ==========================================
// 职责: 抽样表解析 + 失重核算
// 红线: 纯函数，不拼 SQL，不持有 I/O 句柄，不报错
// ==========================================

pub mod loss;
pub mod sampling;

// 重导出核心引擎
pub use loss::{calculate_loss, round_half_away_from_zero, LossEngine};
pub use sampling::{resolve_sample_size, SamplingTableResolver};
