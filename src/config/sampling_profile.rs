use crate::domain::sampling::{validate_sampling_ranges, SamplingRange, S4_PLAN_ID, S4_RANGES};
use crate::engine::sampling::SamplingTableResolver;
use serde::{Deserialize, Serialize};

/// 抽样方案（持久化对象）
///
/// 存储位置：config_kv（scope_id='global'，key='sampling_plan/{plan_id}'）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPlanProfile {
    /// 方案 ID（用于选择/引用）
    pub plan_id: String,

    /// 显示名称
    pub title: String,

    /// 说明（可选）
    #[serde(default)]
    pub description: Option<String>,

    /// 区间表（按 min 升序）
    pub ranges: Vec<SamplingRange>,
}

impl SamplingPlanProfile {
    /// 内置 S4 方案
    pub fn builtin_s4() -> Self {
        Self {
            plan_id: S4_PLAN_ID.to_string(),
            title: "S4".to_string(),
            description: Some("Nível especial de inspeção S4".to_string()),
            ranges: S4_RANGES.to_vec(),
        }
    }

    /// 校验方案（ID 非空 + 区间划分有效）
    pub fn validate(&self) -> Result<(), String> {
        if self.plan_id.trim().is_empty() {
            return Err("plan_id 不能为空".to_string());
        }
        if self.plan_id.contains('/') {
            return Err(format!("plan_id 不能包含 '/': {}", self.plan_id));
        }
        validate_sampling_ranges(&self.ranges)
    }

    /// 构建解析器
    pub fn to_resolver(&self) -> Result<SamplingTableResolver, String> {
        if self.plan_id == S4_PLAN_ID && self.ranges.as_slice() == S4_RANGES.as_slice() {
            return Ok(SamplingTableResolver::s4());
        }
        SamplingTableResolver::from_ranges(&self.plan_id, self.ranges.clone())
    }
}
