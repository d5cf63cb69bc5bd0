// ==========================================
// CheckPeso - 导入批次领域模型
// ==========================================
// 用途: 批量导入的逐行问题与汇总结果
// 红线: 单行失败不阻断整批
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RowIssue - 行级问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row: usize,      // 原始文件行号（表头为第 1 行）
    pub message: String, // 问题描述
}

impl RowIssue {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

// ==========================================
// ImportSummary - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch_id: String,       // 批次 ID（UUID）
    pub total_rows: usize,      // 数据行数（不含表头与空行）
    pub imported: usize,        // 成功落库行数
    pub rejected: usize,        // 被拒绝行数
    pub issues: Vec<RowIssue>,  // 拒绝原因明细（按行号升序）
    pub elapsed_ms: u64,        // 导入耗时（毫秒）
}
