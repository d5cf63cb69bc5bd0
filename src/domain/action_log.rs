// ==========================================
// CheckPeso - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录（新建/修改/删除/导入/配置变更）
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,       // 存储为字符串，见 ActionType::as_str
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub record_id: Option<String>, // 关联记录（配置类操作为 None）
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    /// 创建新日志（自动生成 UUID 和时间戳）
    pub fn new(
        action_type: ActionType,
        actor: &str,
        record_id: Option<String>,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            record_id,
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    ImportBatch,
    UpdateConfig,
    SaveSamplingPlan,
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateRecord => "CREATE_RECORD",
            ActionType::UpdateRecord => "UPDATE_RECORD",
            ActionType::DeleteRecord => "DELETE_RECORD",
            ActionType::ImportBatch => "IMPORT_BATCH",
            ActionType::UpdateConfig => "UPDATE_CONFIG",
            ActionType::SaveSamplingPlan => "SAVE_SAMPLING_PLAN",
        }
    }
}
